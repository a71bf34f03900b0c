use std::{
    io::{ErrorKind, Read},
    sync::{Arc, Condvar, Mutex, MutexGuard, PoisonError},
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    foundation::error::{BoothError, BoothResult},
    media::source::LiveSource,
    raster::Bitmap,
};

/// Live source over a stream of packed, opaque RGBA8 frames of fixed size.
///
/// A background thread drains the stream continuously and keeps only the newest complete frame,
/// so a slow consumer always sees the current image instead of a backlog.
pub struct RawVideoSource {
    width: u32,
    height: u32,
    shared: Arc<Shared>,
}

#[derive(Default)]
struct Shared {
    state: Mutex<State>,
    ready: Condvar,
}

#[derive(Default)]
struct State {
    latest: Option<Bitmap>,
    frames: u64,
    ended: bool,
    error: Option<String>,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, State> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RawVideoSource {
    /// Start draining `reader` on a background thread.
    pub fn spawn<R>(reader: R, width: u32, height: u32) -> BoothResult<Self>
    where
        R: Read + Send + 'static,
    {
        if width == 0 || height == 0 {
            return Err(BoothError::validation("raw video frames must be non-empty"));
        }
        let frame_len = crate::raster::bitmap::byte_len(width, height)?;
        let shared = Arc::new(Shared::default());

        let thread_shared = Arc::clone(&shared);
        std::thread::Builder::new()
            .name("raw-video-reader".to_string())
            .spawn(move || read_frames(reader, width, height, frame_len, &thread_shared))
            .context("spawn raw video reader thread")?;

        Ok(Self {
            width,
            height,
            shared,
        })
    }

    pub fn frames_received(&self) -> u64 {
        self.shared.lock().frames
    }

    pub fn is_ended(&self) -> bool {
        self.shared.lock().ended
    }

    /// Block until the first frame arrives.
    ///
    /// A stream that ends or stays silent for `timeout` never delivered an image, which for a
    /// camera means it could not be opened.
    pub fn wait_for_first_frame(&self, timeout: Duration) -> BoothResult<()> {
        let guard = self.shared.lock();
        let (state, _) = self
            .shared
            .ready
            .wait_timeout_while(guard, timeout, |s| s.latest.is_none() && !s.ended)
            .unwrap_or_else(PoisonError::into_inner);
        if state.latest.is_some() {
            return Ok(());
        }
        if state.ended {
            let detail = state.error.as_deref().unwrap_or("end of stream");
            return Err(BoothError::permission_denied(format!(
                "video stream ended before the first frame ({detail})"
            )));
        }
        Err(BoothError::permission_denied(format!(
            "no video frame within {}s",
            timeout.as_secs_f32()
        )))
    }
}

fn read_frames<R: Read>(mut reader: R, width: u32, height: u32, frame_len: usize, shared: &Shared) {
    loop {
        let mut buf = vec![0u8; frame_len];
        let outcome = reader
            .read_exact(&mut buf)
            .map_err(|e| {
                (e.kind() != ErrorKind::UnexpectedEof).then(|| format!("read failed: {e}"))
            })
            .and_then(|()| Bitmap::from_premul(width, height, buf).map_err(|e| Some(e.to_string())));

        let mut state = shared.lock();
        match outcome {
            Ok(frame) => {
                state.latest = Some(frame);
                state.frames += 1;
                shared.ready.notify_all();
            }
            Err(error) => {
                state.ended = true;
                state.error = error;
                shared.ready.notify_all();
                return;
            }
        }
    }
}

impl LiveSource for RawVideoSource {
    /// Newest frame. Blocks only until the first frame arrives; `None` means the stream ended.
    fn current_frame(&mut self) -> BoothResult<Option<Bitmap>> {
        let guard = self.shared.lock();
        let state = self
            .shared
            .ready
            .wait_while(guard, |s| s.latest.is_none() && !s.ended)
            .unwrap_or_else(PoisonError::into_inner);
        if state.ended {
            if let Some(e) = &state.error {
                tracing::warn!(error = %e, "video stream failed");
            }
            return Ok(None);
        }
        Ok(state.latest.clone())
    }

    fn describe(&self) -> String {
        format!("raw video {}x{}", self.width, self.height)
    }
}
