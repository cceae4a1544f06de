//! Hand-maintained mirror of `proto/hashprobe.proto`.
//!
//! The message set is small and frozen, so the prost structs are kept
//! in-tree instead of being generated at build time; the client speaks
//! the unary call directly through `tonic::client::Grpc`.

/// Position to probe, in FEN notation.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HashProbeRequest {
    #[prost(string, tag = "1")]
    pub fen: ::prost::alloc::string::String,
}

/// Square names like `e2`/`e4`; promotion is a piece letter or empty.
#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HashProbeMove {
    #[prost(string, tag = "1")]
    pub from_sq: ::prost::alloc::string::String,
    #[prost(string, tag = "2")]
    pub to_sq: ::prost::alloc::string::String,
    #[prost(string, tag = "3")]
    pub promotion: ::prost::alloc::string::String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum ScoreType {
    ScoreNone = 0,
    ScoreCp = 1,
    ScoreMate = 2,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, ::prost::Enumeration)]
#[repr(i32)]
pub enum Bound {
    BoundNone = 0,
    BoundExact = 1,
    BoundUpper = 2,
    BoundLower = 3,
}

#[derive(Clone, Copy, PartialEq, ::prost::Message)]
pub struct HashProbeScore {
    #[prost(enumeration = "ScoreType", tag = "1")]
    pub score_type: i32,
    /// Centipawns when `score_type` is `ScoreCp`, moves-to-mate when
    /// `ScoreMate`; both from the probed side's point of view.
    #[prost(sint32, tag = "2")]
    pub score_cp: i32,
    #[prost(sint32, tag = "3")]
    pub score_mate: i32,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HashProbeLine {
    /// Absent on the root entry.
    #[prost(message, optional, tag = "1")]
    pub r#move: ::core::option::Option<HashProbeMove>,
    #[prost(bool, tag = "2")]
    pub found: bool,
    /// The fields below are meaningless when `found` is false.
    #[prost(uint32, tag = "3")]
    pub depth: u32,
    #[prost(enumeration = "Bound", tag = "4")]
    pub bound: i32,
    /// Search score; falls back to the static eval when absent.
    #[prost(message, optional, tag = "5")]
    pub value: ::core::option::Option<HashProbeScore>,
    #[prost(message, optional, tag = "6")]
    pub eval: ::core::option::Option<HashProbeScore>,
    #[prost(message, repeated, tag = "7")]
    pub pv: ::prost::alloc::vec::Vec<HashProbeMove>,
}

#[derive(Clone, PartialEq, ::prost::Message)]
pub struct HashProbeResponse {
    #[prost(message, optional, tag = "1")]
    pub root: ::core::option::Option<HashProbeLine>,
    #[prost(message, repeated, tag = "2")]
    pub line: ::prost::alloc::vec::Vec<HashProbeLine>,
}

pub mod hash_probe_client {
    use tonic::codec::ProstCodec;
    use tonic::codegen::http::uri::PathAndQuery;
    use tonic::transport::Channel;

    use super::HashProbeRequest;
    use super::HashProbeResponse;

    /// Unary client for `hashprobe.HashProbe`.
    #[derive(Debug, Clone)]
    pub struct HashProbeClient {
        inner: tonic::client::Grpc<Channel>,
    }

    impl HashProbeClient {
        pub fn new(channel: Channel) -> Self {
            Self {
                inner: tonic::client::Grpc::new(channel),
            }
        }

        pub async fn probe(
            &mut self,
            request: HashProbeRequest,
        ) -> std::result::Result<tonic::Response<HashProbeResponse>, tonic::Status> {
            self.inner.ready().await.map_err(|e| {
                tonic::Status::unknown(format!("Service was not ready: {}", e))
            })?;
            let codec: ProstCodec<HashProbeRequest, HashProbeResponse> = ProstCodec::default();
            let path = PathAndQuery::from_static("/hashprobe.HashProbe/Probe");
            self.inner
                .unary(tonic::Request::new(request), path, codec)
                .await
        }
    }
}
