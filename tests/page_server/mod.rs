use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;

/// Serves fixed HTML pages by path; anything else is 404.
pub struct PageServer {
    pub base_url: String,
    hits: Arc<AtomicUsize>,
    shutdown_tx: Option<mpsc::Sender<()>>,
    handle: Option<thread::JoinHandle<()>>,
}

impl PageServer {
    pub fn spawn(pages: Vec<(&'static str, u16, String)>) -> Self {
        let server = tiny_http::Server::http("127.0.0.1:0").expect("start page server");
        let addr = server.server_addr();
        let base_url = format!("http://{addr}");

        let pages = pages
            .into_iter()
            .map(|(path, status, body)| (path.to_owned(), (status, body)))
            .collect::<HashMap<_, _>>();

        let (shutdown_tx, shutdown_rx) = mpsc::channel::<()>();
        let hits = Arc::new(AtomicUsize::new(0));
        let thread_hits = Arc::clone(&hits);

        let handle = thread::spawn(move || {
            loop {
                if shutdown_rx.try_recv().is_ok() {
                    break;
                }

                let request = match server.recv_timeout(Duration::from_millis(50)) {
                    Ok(Some(req)) => req,
                    Ok(None) => continue,
                    Err(_) => break,
                };
                thread_hits.fetch_add(1, Ordering::SeqCst);

                let path = request.url().to_string();
                let (status, body) = pages
                    .get(&path)
                    .cloned()
                    .unwrap_or((404, "not found".to_owned()));

                let header = tiny_http::Header::from_bytes(
                    &b"Content-Type"[..],
                    &b"text/html; charset=utf-8"[..],
                )
                .expect("build header");
                let response = tiny_http::Response::from_string(body)
                    .with_status_code(status)
                    .with_header(header);
                let _ = request.respond(response);
            }
        });

        Self {
            base_url,
            hits,
            shutdown_tx: Some(shutdown_tx),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base_url)
    }

    #[allow(dead_code)]
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

impl Drop for PageServer {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown_tx.take() {
            let _ = tx.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
