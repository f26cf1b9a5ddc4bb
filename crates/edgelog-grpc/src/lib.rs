pub mod access_log_handler;
pub mod conversions;
pub mod error;
pub mod logs_handler;
pub mod server;

pub use access_log_handler::AccessLogServiceHandler;
pub use logs_handler::LogsServiceHandler;
pub use server::{run_grpc_server, GrpcServerConfig};
