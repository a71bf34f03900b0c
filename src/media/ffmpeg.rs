use crate::{
    foundation::error::{BoothError, BoothResult},
    media::source::{Constraints, LiveSource},
};

/// Device name that asks for the platform's default camera.
pub const DEFAULT_DEVICE: &str = "default";

/// Open a capture device as a live stream.
///
/// The call returns only once the first frame has arrived. Any failure to get there (missing
/// binary, busy or forbidden device, device that never produces a frame) is reported as
/// [`BoothError::PermissionDenied`] together with what ffmpeg printed.
#[cfg(feature = "media-ffmpeg")]
pub fn acquire_live_stream(
    device: &str,
    constraints: &Constraints,
) -> BoothResult<Box<dyn LiveSource>> {
    Ok(Box::new(imp::FfmpegCamera::spawn(device, constraints)?))
}

#[cfg(not(feature = "media-ffmpeg"))]
pub fn acquire_live_stream(
    _device: &str,
    _constraints: &Constraints,
) -> BoothResult<Box<dyn LiveSource>> {
    Err(BoothError::permission_denied(
        "live capture requires the 'media-ffmpeg' feature",
    ))
}

pub fn is_ffmpeg_on_path() -> bool {
    std::process::Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

/// Platform input format for `ffmpeg -f`.
pub fn input_format() -> &'static str {
    if cfg!(target_os = "macos") {
        "avfoundation"
    } else if cfg!(target_os = "windows") {
        "dshow"
    } else {
        "v4l2"
    }
}

/// Resolve [`DEFAULT_DEVICE`] for `format`; any other name passes through unchanged.
///
/// The first enumerated camera is taken as the user-facing one and the second as the rear one,
/// which is how built-in laptop and phone cameras are ordered by v4l2 and avfoundation. dshow
/// only opens cameras by name, so it has no default.
pub fn resolve_device(device: &str, format: &str, constraints: &Constraints) -> BoothResult<String> {
    if device != DEFAULT_DEVICE {
        return Ok(device.to_string());
    }
    let index = if constraints.facing_user { 0 } else { 1 };
    match format {
        "v4l2" => Ok(format!("/dev/video{index}")),
        "avfoundation" => Ok(format!("{index}:none")),
        _ => Err(BoothError::permission_denied(format!(
            "no default camera for '{format}', pass a device name"
        ))),
    }
}

#[cfg(feature = "media-ffmpeg")]
mod imp {
    use std::{
        io::Read as _,
        process::{Child, Command, Stdio},
        thread::JoinHandle,
        time::Duration,
    };

    use anyhow::Context as _;

    use super::*;
    use crate::{media::raw::RawVideoSource, raster::Bitmap};

    const FIRST_FRAME_TIMEOUT: Duration = Duration::from_secs(10);

    /// Raw RGBA frames piped out of an `ffmpeg` process reading a capture device.
    ///
    /// Frames are scaled by ffmpeg to the ideal constraint size, so every frame has the same
    /// dimensions.
    pub(super) struct FfmpegCamera {
        device: String,
        frames: RawVideoSource,
        child: Child,
    }

    impl FfmpegCamera {
        pub(super) fn spawn(device: &str, constraints: &Constraints) -> BoothResult<Self> {
            let (width, height) = (constraints.ideal_width, constraints.ideal_height);
            if width == 0 || height == 0 {
                return Err(BoothError::validation("capture constraints must be non-zero"));
            }
            if !is_ffmpeg_on_path() {
                return Err(BoothError::permission_denied(
                    "camera capture needs ffmpeg, but it was not found on PATH",
                ));
            }
            let format = input_format();
            let device = resolve_device(device, format, constraints)?;

            let mut child = Command::new("ffmpeg")
                .args(["-loglevel", "error", "-f", format])
                .args(["-video_size", &format!("{width}x{height}")])
                .arg("-i")
                .arg(&device)
                .args(["-vf", &format!("scale={width}:{height}")])
                .args(["-f", "rawvideo", "-pix_fmt", "rgba", "pipe:1"])
                .stdin(Stdio::null())
                .stdout(Stdio::piped())
                .stderr(Stdio::piped())
                .spawn()
                .map_err(|e| {
                    BoothError::permission_denied(format!("failed to start ffmpeg: {e}"))
                })?;

            let stderr = match child.stderr.take().map(drain_stderr).transpose() {
                Ok(h) => h,
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(e);
                }
            };
            let Some(stdout) = child.stdout.take() else {
                let _ = child.kill();
                let _ = child.wait();
                return Err(BoothError::permission_denied("ffmpeg stdout was not captured"));
            };

            let frames = RawVideoSource::spawn(stdout, width, height)
                .and_then(|f| f.wait_for_first_frame(FIRST_FRAME_TIMEOUT).map(|()| f));
            let frames = match frames {
                Ok(f) => f,
                Err(e) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    let log = stderr
                        .and_then(|h| h.join().ok())
                        .unwrap_or_default();
                    let log = log.trim();
                    return Err(BoothError::permission_denied(if log.is_empty() {
                        format!("camera '{device}' could not be opened: {e}")
                    } else {
                        format!("camera '{device}' could not be opened: {log}")
                    }));
                }
            };

            tracing::info!(device = %device, width, height, "camera stream opened");
            Ok(Self {
                device,
                frames,
                child,
            })
        }
    }

    /// Keep ffmpeg's stderr pipe from filling up, and keep its text for error reports.
    fn drain_stderr(mut pipe: std::process::ChildStderr) -> BoothResult<JoinHandle<String>> {
        let handle = std::thread::Builder::new()
            .name("ffmpeg-stderr".to_string())
            .spawn(move || {
                let mut buf = Vec::new();
                let _ = pipe.read_to_end(&mut buf);
                String::from_utf8_lossy(&buf).into_owned()
            })
            .context("spawn ffmpeg stderr reader")?;
        Ok(handle)
    }

    impl LiveSource for FfmpegCamera {
        fn current_frame(&mut self) -> BoothResult<Option<Bitmap>> {
            let frame = self.frames.current_frame()?;
            if frame.is_none() {
                tracing::info!(device = %self.device, "camera stream ended");
            }
            Ok(frame)
        }

        fn describe(&self) -> String {
            format!("ffmpeg {} ({})", self.device, self.frames.describe())
        }
    }

    impl Drop for FfmpegCamera {
        fn drop(&mut self) {
            let _ = self.child.kill();
            let _ = self.child.wait();
        }
    }
}
