use crate::{
    assets::{decode::decode_image, store::AssetStore},
    capture::{
        countdown::{Countdown, CountdownStep},
        crop::crop_to_fit,
        session::{CaptureSession, Stage},
    },
    config::BoothConfig,
    export::encode_surface,
    filter::FilterChain,
    foundation::{
        core::{CanvasSize, Cell},
        error::{BoothError, BoothResult},
    },
    handoff::{HandoffStore, encode_data_url},
    media::source::LiveSource,
    nav::{Navigator, Page},
    raster::{Bitmap, DrawOpts, Surface},
};

/// What the host should do after an animation-frame callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PreviewTick {
    /// Schedule another frame.
    Continue,
    /// Stop scheduling: capture is finalized, no stream is attached, or the stream ended.
    Stop,
}

/// Controller for the capture page.
///
/// Owns the strip surface and capture session, and the handoff store and navigator that
/// finalization writes to. Every method corresponds to one host event (animation frame, button
/// press, timer tick, upload), and events never overlap.
pub struct Compositor<H, N> {
    config: BoothConfig,
    assets: AssetStore,
    surface: Surface,
    session: CaptureSession,
    countdown: Countdown,
    trigger_enabled: bool,
    source: Option<Box<dyn LiveSource>>,
    preview_filter: FilterChain,
    strip: Option<Bitmap>,
    handoff: H,
    nav: N,
}

impl<H: HandoffStore, N: Navigator> Compositor<H, N> {
    pub fn new(config: BoothConfig, assets: AssetStore, handoff: H, nav: N) -> BoothResult<Self> {
        config.validate()?;
        let preview_filter = match &config.preview_filter {
            Some(f) => FilterChain::parse(f)?,
            None => FilterChain::none(),
        };
        Ok(Self {
            surface: Surface::new(config.canvas)?,
            session: CaptureSession::new(),
            countdown: Countdown::new(config.countdown_ticks),
            trigger_enabled: true,
            source: None,
            preview_filter,
            strip: None,
            assets,
            config,
            handoff,
            nav,
        })
    }

    pub fn canvas(&self) -> CanvasSize {
        self.config.canvas
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn stage(&self) -> Stage {
        self.session.stage()
    }

    pub fn session(&self) -> &CaptureSession {
        &self.session
    }

    pub fn trigger_enabled(&self) -> bool {
        self.trigger_enabled && !self.session.is_done()
    }

    pub fn countdown_value(&self) -> Option<u32> {
        self.countdown.value()
    }

    /// The finished strip, once finalization succeeded.
    pub fn strip(&self) -> Option<&Bitmap> {
        self.strip.as_ref()
    }

    pub fn has_live_source(&self) -> bool {
        self.source.is_some()
    }

    pub fn handoff(&self) -> &H {
        &self.handoff
    }

    pub fn navigator(&self) -> &N {
        &self.nav
    }

    pub fn into_parts(self) -> (H, N) {
        (self.handoff, self.nav)
    }

    /// Attach a live stream and start previewing into the active cell.
    pub fn attach_live(&mut self, source: Box<dyn LiveSource>) {
        tracing::info!(source = %source.describe(), "live source attached");
        self.source = Some(source);
    }

    /// Acquire a stream with `acquire`; on failure nothing is attached and the error is returned
    /// for the host to show.
    pub fn start_live<F>(&mut self, acquire: F) -> BoothResult<()>
    where
        F: FnOnce() -> BoothResult<Box<dyn LiveSource>>,
    {
        match acquire() {
            Ok(source) => {
                self.attach_live(source);
                Ok(())
            }
            Err(e) => {
                tracing::warn!(error = %e, "camera access failed");
                Err(e)
            }
        }
    }

    /// Replace the preview filter. Only the live preview draw uses it.
    pub fn set_preview_filter(&mut self, filter: &str) -> BoothResult<()> {
        self.preview_filter = FilterChain::parse(filter)?;
        Ok(())
    }

    /// One display-refresh callback of the live preview loop.
    ///
    /// Clears only the active cell and redraws the current frame into it. Returns
    /// [`PreviewTick::Stop`] as soon as there is nothing left to preview, so a finalized cell is
    /// never drawn over.
    pub fn on_animation_frame(&mut self) -> BoothResult<PreviewTick> {
        let Some(cell) = self.session.active_cell() else {
            return Ok(PreviewTick::Stop);
        };
        let Some(source) = self.source.as_mut() else {
            return Ok(PreviewTick::Stop);
        };
        let Some(frame) = source.current_frame()? else {
            tracing::info!("live stream ended, stopping preview");
            self.source = None;
            return Ok(PreviewTick::Stop);
        };

        let mirror = self.config.mirror.live;
        let filter = self.preview_filter.clone();
        self.draw_into_cell(&frame, cell, mirror, Some(&filter))?;
        Ok(PreviewTick::Continue)
    }

    /// "Take photo" press: disable the trigger and start the countdown.
    ///
    /// Returns the first countdown value to display.
    pub fn take_photo(&mut self) -> BoothResult<u32> {
        if self.session.is_done() {
            tracing::warn!("take photo pressed after both cells were captured");
            return Err(BoothError::OverCapture);
        }
        if !self.trigger_enabled || self.countdown.is_running() {
            tracing::warn!("take photo pressed while a countdown is running");
            return Err(BoothError::validation("photo trigger is disabled"));
        }
        self.trigger_enabled = false;
        Ok(self.countdown.start())
    }

    /// One countdown interval elapsed. Captures when the countdown fires.
    pub fn on_countdown_tick(&mut self) -> BoothResult<CountdownStep> {
        let step = self.countdown.tick();
        if step == CountdownStep::Fire {
            self.capture()?;
        }
        Ok(step)
    }

    /// Freeze the active cell as currently drawn on the surface and advance.
    ///
    /// Re-enables the trigger after the top cell; finalizes after the bottom cell.
    pub fn capture(&mut self) -> BoothResult<Stage> {
        let cell = self.session.active_cell().ok_or(BoothError::OverCapture)?;
        let snapshot = self.surface.copy_region(self.config.canvas.cell_rect(cell))?;
        self.commit(snapshot)
    }

    /// Place an uploaded still into the active cell.
    ///
    /// Undecodable data is rejected with [`BoothError::Decode`] and more than two uploads with
    /// [`BoothError::OverCapture`]; neither changes any state.
    pub fn upload(&mut self, bytes: &[u8]) -> BoothResult<Stage> {
        let Some(cell) = self.session.active_cell() else {
            tracing::warn!("upload rejected: only two photos are needed");
            return Err(BoothError::OverCapture);
        };
        let image = decode_image(bytes)?;
        self.upload_bitmap(&image, cell)
    }

    fn upload_bitmap(&mut self, image: &Bitmap, cell: Cell) -> BoothResult<Stage> {
        let mirror = self.config.mirror.upload;
        self.draw_into_cell(image, cell, mirror, None)?;
        let snapshot = self.surface.copy_region(self.config.canvas.cell_rect(cell))?;
        self.commit(snapshot)
    }

    fn commit(&mut self, snapshot: Bitmap) -> BoothResult<Stage> {
        let stage = self.session.record(snapshot)?;
        match stage {
            Stage::Done => {
                self.finalize()?;
            }
            _ => self.trigger_enabled = true,
        }
        Ok(stage)
    }

    fn draw_into_cell(
        &mut self,
        image: &Bitmap,
        cell: Cell,
        mirror: bool,
        filter: Option<&FilterChain>,
    ) -> BoothResult<()> {
        let canvas = self.config.canvas;
        let crop = crop_to_fit(
            f64::from(image.width),
            f64::from(image.height),
            f64::from(canvas.width),
            f64::from(canvas.half()),
        )?;
        let dst = canvas.cell_rect(cell);
        let opts = DrawOpts {
            mirror_x: mirror,
            filter,
        };
        self.surface.clear_rect(dst);
        self.surface.draw_image(image, crop.to_rect(), dst, opts)
    }

    /// Assemble both cells, stamp the frame overlay, hand the strip off and navigate to the
    /// editor.
    ///
    /// A frame overlay that cannot be loaded fails finalization: nothing is handed off and the
    /// host may retry once the asset is available.
    #[tracing::instrument(skip(self), fields(frame = %self.config.frame_asset))]
    pub fn finalize(&mut self) -> BoothResult<Bitmap> {
        if !self.session.is_done() {
            return Err(BoothError::validation(
                "cannot finalize before both cells are captured",
            ));
        }
        if let Some(strip) = &self.strip {
            return Ok(strip.clone());
        }
        self.source = None;

        let canvas = self.config.canvas;
        let captured = self.session.captured().to_vec();
        for (i, cell_image) in captured.iter().enumerate() {
            let cell = Cell::from_index(i)
                .ok_or_else(|| BoothError::validation("capture session holds more than two cells"))?;
            self.surface
                .draw_image_fill(cell_image, canvas.cell_rect(cell), DrawOpts::default())?;
        }

        let frame = self.assets.load(&self.config.frame_asset)?;
        self.surface
            .draw_image_fill(&frame, canvas.full_rect(), DrawOpts::default())?;

        let strip = self.surface.to_bitmap();
        self.handoff.put(encode_data_url(&strip)?)?;
        self.strip = Some(strip.clone());
        tracing::info!("photo strip finalized");
        self.nav.go_to(Page::Editor);
        Ok(strip)
    }

    /// Encode the surface as it is now.
    pub fn export(&self) -> BoothResult<Vec<u8>> {
        encode_surface(&self.surface, self.config.export.format)
    }

    pub fn export_filename(&self) -> &str {
        &self.config.export.capture_filename
    }

    /// Start over: empty session, blank surface, trigger enabled. The live source stays attached.
    pub fn reset(&mut self) {
        self.session.reset();
        self.countdown.reset();
        self.surface.clear();
        self.trigger_enabled = true;
        self.strip = None;
    }
}
