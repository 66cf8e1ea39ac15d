//! gRPC transport layer.

mod role_grpc;

pub use role_grpc::RoleGrpcService;
