//! Telephony gateway adapters

pub mod rpc_gateway;

pub use rpc_gateway::RpcTelephonyGateway;
