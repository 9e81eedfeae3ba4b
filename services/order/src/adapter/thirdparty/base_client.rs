use std::result::Result;
use std::sync::Arc;

use http_body_util::{BodyExt, Empty};
use hyper::body::Bytes;
use hyper::client::conn::http1::{handshake, SendRequest};
use hyper::header::{HeaderValue, ACCEPT, HOST};
use hyper::{Method, Request, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::net::TcpStream;

use shopping_common::error::AppErrorCode;
use shopping_common::logging::{app_log_event, AppLogContext, AppLogLevel};

use crate::constant::HTTP_CONTENT_TYPE_JSON;
use crate::error::AppError;

/// One plain HTTP/1.1 connection to the flag extension, which listens
/// on a local port next to the service. A connection serves one lookup.
pub(super) struct FlagExtensionConn {
    sender: SendRequest<Empty<Bytes>>,
    authority: String,
    logctx: Arc<AppLogContext>,
}

impl FlagExtensionConn {
    pub(super) async fn connect(
        host: &str,
        port: u16,
        logctx: Arc<AppLogContext>,
    ) -> Result<Self, AppError> {
        let stream = TcpStream::connect((host, port)).await?;
        let (sender, conn) = handshake(TokioIo::new(stream))
            .await
            .map_err(|e| AppError {
                code: AppErrorCode::HttpHandshakeFailure,
                detail: Some(e.to_string()),
            })?;
        let logctx_p = logctx.clone();
        let authority = format!("{host}:{port}");
        let peer = authority.clone();
        // drives the socket until the response is fully read
        let _handle = tokio::task::spawn(async move {
            if let Err(e) = conn.await {
                app_log_event!(logctx_p, AppLogLevel::ERROR, peer = %peer, "connection error: {e}");
            }
        });
        Ok(Self {
            sender,
            authority,
            logctx,
        })
    }

    /// GET a JSON document, returns the status and the whole body
    pub(super) async fn get_json(mut self, path: &str) -> Result<(StatusCode, Bytes), AppError> {
        let invalid_req = |detail: String| AppError {
            code: AppErrorCode::InvalidInput,
            detail: Some(detail),
        };
        let host_val =
            HeaderValue::from_str(self.authority.as_str()).map_err(|e| invalid_req(e.to_string()))?;
        let req = Request::builder()
            .method(Method::GET)
            .uri(path)
            .header(HOST, host_val)
            .header(ACCEPT, HeaderValue::from_static(HTTP_CONTENT_TYPE_JSON))
            .body(Empty::<Bytes>::new())
            .map_err(|e| invalid_req(e.to_string()))?;
        let logctx_p = self.logctx.clone();
        let resp = self.sender.send_request(req).await.map_err(|e| {
            app_log_event!(
                logctx_p,
                AppLogLevel::WARNING,
                peer = %self.authority,
                path,
                "request failed: {e}"
            );
            AppError {
                code: AppErrorCode::HttpHandshakeFailure,
                detail: Some(e.to_string()),
            }
        })?;
        let status = resp.status();
        let body = resp
            .into_body()
            .collect()
            .await
            .map_err(|e| AppError {
                code: AppErrorCode::DataCorruption,
                detail: Some(e.to_string()),
            })?
            .to_bytes();
        app_log_event!(
            logctx_p,
            AppLogLevel::DEBUG,
            peer = %self.authority,
            path,
            status = status.as_u16(),
            nbytes = body.len(),
            "flag lookup done"
        );
        Ok((status, body))
    } // end of fn get_json
} // end of impl FlagExtensionConn
