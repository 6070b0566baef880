//! Outbound transport: request entity, per-bot session and response
//! wrapper.

mod client;
mod request;
mod response;

pub use client::{DEFAULT_BASE_URL, HttpClient, RawResponse, ReqwestHttpClient, TelegramClient};
pub use request::{
    DEFAULT_CONNECT_TIMEOUT, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT, FileUpload, ParamValue,
    TelegramRequest,
};
pub use response::TelegramResponse;
