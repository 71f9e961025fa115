//! Protobuf messages this core reads itself.
//!
//! Only the structured header and the server-list body are declared here.
//! Game message bodies stay opaque payload bytes for the application.

use crate::core::header::JOB_ID_NONE;

/// Header carried by every protobuf-framed message.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CMsgProtoBufHeader {
    #[prost(fixed64, optional, tag = "1")]
    pub steamid: Option<u64>,
    #[prost(int32, optional, tag = "2")]
    pub client_sessionid: Option<i32>,
    #[prost(uint32, optional, tag = "3")]
    pub routing_appid: Option<u32>,
    #[prost(fixed64, optional, tag = "10")]
    pub jobid_source: Option<u64>,
    #[prost(fixed64, optional, tag = "11")]
    pub jobid_target: Option<u64>,
    #[prost(string, optional, tag = "12")]
    pub target_job_name: Option<String>,
    #[prost(int32, optional, tag = "13")]
    pub eresult: Option<i32>,
    #[prost(string, optional, tag = "14")]
    pub error_message: Option<String>,
}

impl CMsgProtoBufHeader {
    /// Source job, `JOB_ID_NONE` when absent.
    pub fn source_job_id(&self) -> u64 {
        self.jobid_source.unwrap_or(JOB_ID_NONE)
    }

    /// Target job, `JOB_ID_NONE` when absent.
    pub fn target_job_id(&self) -> u64 {
        self.jobid_target.unwrap_or(JOB_ID_NONE)
    }
}

/// Body of `ClientServerList`.
#[derive(Clone, PartialEq, prost::Message)]
pub struct CMsgClientServerList {
    #[prost(message, repeated, tag = "1")]
    pub servers: Vec<c_msg_client_server_list::Server>,
}

pub mod c_msg_client_server_list {
    #[derive(Clone, PartialEq, prost::Message)]
    pub struct Server {
        #[prost(int32, optional, tag = "1")]
        pub server_type: Option<i32>,
        #[prost(uint32, optional, tag = "2")]
        pub server_ip: Option<u32>,
        #[prost(uint32, optional, tag = "3")]
        pub server_port: Option<u32>,
    }
}
