//! Shared HTTP plumbing for the collectors.

use std::time::Duration;

use crate::CollectError;

/// Timeout applied to every collector request.
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Send a GET request and return the body of a successful response.
pub(crate) async fn get_text(
    client: &reqwest::Client,
    url: &str,
    params: &[(&str, String)],
    timeout: Duration,
) -> Result<String, CollectError> {
    let resp = client.get(url).query(params).timeout(timeout).send().await?;
    let status = resp.status();
    if !status.is_success() {
        let body = resp.text().await.unwrap_or_default();
        return Err(CollectError::Server {
            status: status.as_u16(),
            body,
        });
    }
    Ok(resp.text().await?)
}

/// One-shot local HTTP responder for exercising the collectors.
#[cfg(test)]
pub(crate) mod testing {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;
    use tokio::task::JoinHandle;

    /// Serve `responses` in order, one connection each, then stop listening.
    /// Resolves to the request line of every request received.
    pub(crate) async fn serve(
        path: &str,
        responses: Vec<(u16, String)>,
    ) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}{path}", listener.local_addr().unwrap());
        let handle = tokio::spawn(async move {
            let mut requests = Vec::new();
            for (status, body) in responses {
                let (mut socket, _) = listener.accept().await.unwrap();
                let mut head = Vec::new();
                let mut chunk = [0u8; 1024];
                while !head.windows(4).any(|w| w == b"\r\n\r\n") {
                    let n = socket.read(&mut chunk).await.unwrap();
                    if n == 0 {
                        break;
                    }
                    head.extend_from_slice(&chunk[..n]);
                }
                let head = String::from_utf8_lossy(&head);
                requests.push(head.lines().next().unwrap_or_default().to_string());

                let response = format!(
                    "HTTP/1.1 {status} Test\r\nContent-Type: application/json\r\n\
                     Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                socket.write_all(response.as_bytes()).await.unwrap();
                socket.shutdown().await.unwrap();
            }
            requests
        });
        (url, handle)
    }
}
