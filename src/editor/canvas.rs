use std::collections::HashMap;

use kurbo::{Point, Rect};

use crate::{
    assets::store::AssetStore,
    config::BoothConfig,
    editor::{
        pointer::{DragState, Viewport},
        sticker::{Sticker, StickerStack},
    },
    export::encode_surface,
    filter::FilterChain,
    foundation::{
        core::CanvasSize,
        error::{BoothError, BoothResult},
    },
    handoff::{HandoffStore, decode_data_url},
    nav::{Navigator, Page},
    raster::{Bitmap, DrawOpts, Surface},
};

/// Controller for the sticker page.
///
/// Redraws only when its state changes; there is no continuous loop. The editor can only be
/// built around a decoded background, so sticker actions never see an undecoded strip.
pub struct StickerEditor {
    config: BoothConfig,
    assets: AssetStore,
    surface: Surface,
    background: Bitmap,
    background_filter: FilterChain,
    stickers: StickerStack,
    drag: DragState,
    viewport: Viewport,
    cycles: HashMap<String, usize>,
    renders: u64,
}

impl StickerEditor {
    /// Consume the pending handoff payload and open the editor on it.
    ///
    /// The configuration is checked before the payload is taken, so a bad configuration leaves
    /// the payload in place. An absent or blank payload sends the host home and returns
    /// [`BoothError::MissingSession`]; nothing is rendered.
    #[tracing::instrument(skip_all)]
    pub fn load(
        config: BoothConfig,
        assets: AssetStore,
        handoff: &mut dyn HandoffStore,
        nav: &mut dyn Navigator,
    ) -> BoothResult<Self> {
        config.validate()?;
        let surface = Surface::new(config.canvas)?;

        let Some(payload) = handoff.take()?.filter(|p| !p.trim().is_empty()) else {
            tracing::warn!("no photo strip found, returning home");
            nav.go_to(Page::Home);
            return Err(BoothError::MissingSession);
        };
        let background = decode_data_url(&payload)?;
        Self::assemble(config, assets, surface, background)
    }

    pub fn with_background(
        config: BoothConfig,
        assets: AssetStore,
        background: Bitmap,
    ) -> BoothResult<Self> {
        config.validate()?;
        let surface = Surface::new(config.canvas)?;
        Self::assemble(config, assets, surface, background)
    }

    fn assemble(
        config: BoothConfig,
        assets: AssetStore,
        surface: Surface,
        background: Bitmap,
    ) -> BoothResult<Self> {
        if background.is_empty() {
            return Err(BoothError::decode("background strip is empty"));
        }
        let mut editor = Self {
            viewport: Viewport::identity(config.canvas),
            surface,
            background,
            background_filter: FilterChain::none(),
            stickers: StickerStack::new(),
            drag: DragState::default(),
            cycles: HashMap::new(),
            renders: 0,
            assets,
            config,
        };
        editor.render()?;
        Ok(editor)
    }

    pub fn canvas(&self) -> CanvasSize {
        self.config.canvas
    }

    pub fn surface(&self) -> &Surface {
        &self.surface
    }

    pub fn stickers(&self) -> &StickerStack {
        &self.stickers
    }

    pub fn drag(&self) -> &DragState {
        &self.drag
    }

    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Number of render passes so far.
    pub fn render_count(&self) -> u64 {
        self.renders
    }

    /// Update the displayed geometry after a layout change.
    pub fn set_viewport(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    /// Filter for the background layer only; stickers are never filtered.
    pub fn set_background_filter(&mut self, filter: &str) -> BoothResult<()> {
        self.background_filter = FilterChain::parse(filter)?;
        self.render()
    }

    /// Repaint everything: background (filtered), then stickers in stack order.
    pub fn render(&mut self) -> BoothResult<()> {
        let full = self.config.canvas.full_rect();
        self.surface.clear();
        self.surface.draw_image_fill(
            &self.background,
            full,
            DrawOpts::default().with_filter(&self.background_filter),
        )?;
        for s in &self.stickers {
            self.surface
                .draw_image_fill(&s.image, s.bounds(), DrawOpts::default())?;
        }
        self.renders += 1;
        Ok(())
    }

    /// Add the next variant of a sticker family and return its index.
    ///
    /// The variant is decoded before anything changes; a decode failure leaves the stack and
    /// the family's rotation as they were.
    pub fn add_sticker(&mut self, family: &str) -> BoothResult<usize> {
        let fam = self
            .config
            .family(family)
            .ok_or_else(|| BoothError::validation(format!("unknown sticker family '{family}'")))?;
        let next = self.cycles.get(family).copied().unwrap_or(0);
        let source = fam.variants[next % fam.variants.len()].clone();
        let variant_count = fam.variants.len();

        let image = self.assets.load(&source)?;
        self.cycles
            .insert(family.to_string(), (next + 1) % variant_count);
        tracing::debug!(family, variant = %source, "sticker added");
        self.add_sticker_image(image)
    }

    /// Add an already-decoded sticker image at the default placement.
    pub fn add_sticker_image(&mut self, image: Bitmap) -> BoothResult<usize> {
        if image.is_empty() {
            return Err(BoothError::decode("sticker image is empty"));
        }
        let sticker = Sticker::placed(image, self.config.canvas, self.config.sticker_layout);
        let index = self.stickers.push(sticker);
        self.render()?;
        Ok(index)
    }

    /// Pointer pressed at client position `client`. Returns whether a sticker was picked up.
    pub fn on_pointer_down(&mut self, client: Point) -> BoothResult<bool> {
        let p = self.viewport.to_logical(client);
        let Some(hit) = self.stickers.hit_test(p) else {
            return Ok(false);
        };
        let origin = self.stickers.get(hit).map(Sticker::origin).ok_or_else(|| {
            BoothError::validation("hit-tested sticker disappeared from the stack")
        })?;
        let top = self
            .stickers
            .bring_to_front(hit)
            .ok_or_else(|| BoothError::validation("hit-tested sticker could not be raised"))?;
        self.drag.begin(top, p, origin);
        tracing::debug!(from = hit, to = top, "sticker brought to front");
        self.render()?;
        Ok(true)
    }

    /// Pointer moved. Returns whether a dragged sticker moved.
    pub fn on_pointer_move(&mut self, client: Point) -> BoothResult<bool> {
        let Some(index) = self.drag.selected() else {
            return Ok(false);
        };
        let target = self.drag.target_origin(self.viewport.to_logical(client));
        let Some(s) = self.stickers.get_mut(index) else {
            self.drag.end();
            return Ok(false);
        };
        s.x = target.x;
        s.y = target.y;
        self.render()?;
        Ok(true)
    }

    /// Pointer released, left the canvas or was cancelled. Always ends the drag.
    pub fn on_pointer_up(&mut self) {
        self.drag.end();
    }

    /// Remove every sticker, leaving the background.
    pub fn reset(&mut self) -> BoothResult<()> {
        self.drag.end();
        self.stickers.clear();
        self.render()
    }

    pub fn remove_sticker(&mut self, index: usize) -> BoothResult<Sticker> {
        let removed = self
            .stickers
            .remove(index)
            .ok_or_else(|| BoothError::validation(format!("no sticker at index {index}")))?;
        self.drag.end();
        self.render()?;
        Ok(removed)
    }

    /// Bounds of every sticker in paint order.
    pub fn sticker_bounds(&self) -> Vec<Rect> {
        self.stickers.iter().map(Sticker::bounds).collect()
    }

    /// Encode the canvas as currently rendered.
    pub fn export(&self) -> BoothResult<Vec<u8>> {
        encode_surface(&self.surface, self.config.export.format)
    }

    pub fn export_filename(&self) -> &str {
        &self.config.export.editor_filename
    }
}
