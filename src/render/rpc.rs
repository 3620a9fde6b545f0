//! Network transport: one TCP connection per request, carrying
//! length-prefixed `bincode` frames (spec.md §6: "Client sends the
//! serialized Scene plus pass parameters; server streams one message per
//! completed pass"). `RpcServer` wraps a `LocalRenderer` and answers
//! requests; `RpcRenderer` is the client-side `Renderer` a driver mixes in
//! alongside `LocalRenderer` via `render_with`.
use crate::error::RenderError;
use crate::image::Image;
use crate::render::{LocalRenderer, Renderer};
use crate::scene::Scene;
use serde::{Deserialize, Serialize};
use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream, ToSocketAddrs};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;

#[derive(Serialize, Deserialize)]
struct Request {
    scene: Scene,
}

#[derive(Serialize, Deserialize)]
enum PassMessage {
    Pass { index: u32, data: Vec<f64> },
    Done,
}

fn write_frame(stream: &mut TcpStream, bytes: &[u8]) -> std::io::Result<()> {
    stream.write_all(&(bytes.len() as u64).to_le_bytes())?;
    stream.write_all(bytes)
}

fn read_frame(stream: &mut TcpStream) -> std::io::Result<Vec<u8>> {
    let mut len_bytes = [0u8; 8];
    stream.read_exact(&mut len_bytes)?;
    let len = u64::from_le_bytes(len_bytes) as usize;
    let mut buf = vec![0u8; len];
    stream.read_exact(&mut buf)?;
    Ok(buf)
}

/// Client-side `Renderer`: forwards the whole scene to `addr` and folds the
/// streamed per-pass accumulators back into a mean image exactly like
/// `LocalRenderer` would, so the two are interchangeable to `render_with`.
pub struct RpcRenderer {
    pub addr: String,
}

impl RpcRenderer {
    pub fn new(addr: impl Into<String>) -> RpcRenderer {
        RpcRenderer { addr: addr.into() }
    }
}

impl Renderer for RpcRenderer {
    fn render(
        &self,
        scene: &Scene,
        cancel: &AtomicBool,
        on_pass: &mut dyn FnMut(&Image, u32),
    ) -> Result<Image, RenderError> {
        let mut stream = TcpStream::connect(&self.addr).map_err(|source| RenderError::RpcConnection {
            addr: self.addr.clone(),
            source,
        })?;

        let request = Request { scene: scene.clone() };
        let encoded = bincode::serialize(&request).map_err(|source| RenderError::RpcDecode {
            addr: self.addr.clone(),
            source,
        })?;
        write_frame(&mut stream, &encoded).map_err(|source| RenderError::RpcConnection {
            addr: self.addr.clone(),
            source,
        })?;

        let mut sum = vec![0.0f64; scene.width as usize * scene.height as usize * 3];
        let mut completed = 0u32;
        loop {
            if cancel.load(Ordering::Relaxed) {
                break;
            }
            let frame = match read_frame(&mut stream) {
                Ok(f) => f,
                Err(source) => return Err(RenderError::RpcConnection { addr: self.addr.clone(), source }),
            };
            let msg: PassMessage = bincode::deserialize(&frame).map_err(|source| RenderError::RpcDecode {
                addr: self.addr.clone(),
                source,
            })?;
            match msg {
                PassMessage::Pass { index, data } => {
                    for (s, d) in sum.iter_mut().zip(data.iter()) {
                        *s += d;
                    }
                    completed = index + 1;
                    let inv = 1.0 / completed as f64;
                    let image = Image {
                        width: scene.width,
                        height: scene.height,
                        data: sum.iter().map(|v| v * inv).collect(),
                    };
                    on_pass(&image, completed);
                }
                PassMessage::Done => break,
            }
        }

        let inv = 1.0 / completed.max(1) as f64;
        Ok(Image { width: scene.width, height: scene.height, data: sum.iter().map(|v| v * inv).collect() })
    }
}

/// Server loop: accepts connections one at a time, decodes a `Scene`,
/// renders it locally, and streams one `PassMessage::Pass` per completed
/// pass before closing with `PassMessage::Done`. `stop` is the signal
/// channel that lets a caller shut the listener down between connections.
pub fn serve(addr: impl ToSocketAddrs, stop: mpsc::Receiver<()>) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    listener.set_nonblocking(true)?;

    loop {
        if stop.try_recv().is_ok() {
            return Ok(());
        }
        let (stream, peer) = match listener.accept() {
            Ok(conn) => conn,
            Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                std::thread::sleep(std::time::Duration::from_millis(20));
                continue;
            }
            Err(e) => return Err(e),
        };
        tracing::info!(%peer, "accepted render connection");
        if let Err(err) = handle_connection(stream) {
            tracing::warn!(%err, %peer, "render connection ended with an error");
        }
    }
}

fn handle_connection(mut stream: TcpStream) -> std::io::Result<()> {
    stream.set_nonblocking(false)?;
    let frame = read_frame(&mut stream)?;
    let request: Request = bincode::deserialize(&frame)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    let renderer = LocalRenderer::default_workers();
    let cancel = AtomicBool::new(false);
    let mut io_error = None;
    renderer
        .render(&request.scene, &cancel, &mut |image, index| {
            if io_error.is_some() {
                return;
            }
            let msg = PassMessage::Pass { index: index - 1, data: image.data.clone() };
            let encoded = match bincode::serialize(&msg) {
                Ok(e) => e,
                Err(e) => {
                    io_error = Some(std::io::Error::new(std::io::ErrorKind::InvalidData, e));
                    return;
                }
            };
            if let Err(e) = write_frame(&mut stream, &encoded) {
                io_error = Some(e);
            }
        })
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e.to_string()))?;

    if let Some(e) = io_error {
        return Err(e);
    }

    let done = bincode::serialize(&PassMessage::Done)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
    write_frame(&mut stream, &done)
}
