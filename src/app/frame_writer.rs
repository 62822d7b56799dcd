// frame_writer.rs
// Background thread that writes rendered frames to disk while the
// simulation keeps stepping. Frames arrive over a bounded crossbeam channel.

use crossbeam::channel::{self, Sender};
use image::{GrayImage, RgbImage};
use std::path::PathBuf;
use std::thread::JoinHandle;

use crate::config::FRAME_QUEUE_DEPTH;
use crate::error::{LatticeError, LatticeResult};
use crate::io;

pub enum FrameMessage {
    Gray { frame: u64, image: GrayImage },
    Colour { frame: u64, image: RgbImage },
}

/// What the writer produced once the channel closed.
#[derive(Debug, Default)]
pub struct WrittenFrames {
    pub count: usize,
    pub gif: Option<PathBuf>,
}

pub struct FrameWriter {
    tx: Option<Sender<FrameMessage>>,
    handle: Option<JoinHandle<LatticeResult<WrittenFrames>>>,
}

impl FrameWriter {
    /// Spawns the writer. When `gif` is set, grayscale frames are also kept
    /// in memory and encoded as an animation once the run ends.
    pub fn spawn(directory: PathBuf, gif: Option<(PathBuf, u32)>) -> Self {
        let (tx, rx) = channel::bounded::<FrameMessage>(FRAME_QUEUE_DEPTH);
        let handle = std::thread::spawn(move || -> LatticeResult<WrittenFrames> {
            let mut written = WrittenFrames::default();
            let mut movie: Vec<GrayImage> = Vec::new();
            for message in rx {
                match message {
                    FrameMessage::Gray { frame, image } => {
                        let path = io::save_frame(&image, &directory, frame)?;
                        log::trace!("wrote {}", path.display());
                        if gif.is_some() {
                            movie.push(image);
                        }
                    }
                    FrameMessage::Colour { frame, image } => {
                        std::fs::create_dir_all(&directory)?;
                        image.save(directory.join(format!("charge_{frame:05}.png")))?;
                    }
                }
                written.count += 1;
            }
            if let Some((path, delay_ms)) = gif {
                if !movie.is_empty() {
                    io::write_gif(&movie, &path, delay_ms)?;
                    written.gif = Some(path);
                }
            }
            Ok(written)
        });
        Self {
            tx: Some(tx),
            handle: Some(handle),
        }
    }

    pub fn send(&self, message: FrameMessage) -> LatticeResult<()> {
        match &self.tx {
            Some(tx) => tx.send(message).map_err(|_| LatticeError::WriterDisconnected),
            None => Err(LatticeError::WriterDisconnected),
        }
    }

    /// Closes the channel and waits for every queued frame to be written.
    pub fn finish(mut self) -> LatticeResult<WrittenFrames> {
        self.tx.take();
        match self.handle.take() {
            Some(handle) => handle.join().map_err(|_| LatticeError::WriterDisconnected)?,
            None => Ok(WrittenFrames::default()),
        }
    }
}

impl Drop for FrameWriter {
    fn drop(&mut self) {
        self.tx.take();
        if let Some(handle) = self.handle.take() {
            let _ = handle.join();
        }
    }
}
