use kurbo::Rect;

use crate::foundation::error::{BoothError, BoothResult};

/// Source region selected by [`crop_to_fit`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CropRect {
    pub sx: f64,
    pub sy: f64,
    pub sw: f64,
    pub sh: f64,
}

impl CropRect {
    pub fn to_rect(self) -> Rect {
        Rect::new(self.sx, self.sy, self.sx + self.sw, self.sy + self.sh)
    }
}

/// Largest centered region of a `vw`×`vh` source with the aspect ratio of a `w`×`half` cell.
///
/// Wider sources lose equal margins left and right, taller ones top and bottom. When the aspects
/// are equal the vertical branch runs and the crop is the whole source.
pub fn crop_to_fit(vw: f64, vh: f64, w: f64, half: f64) -> BoothResult<CropRect> {
    for (name, v) in [("source width", vw), ("source height", vh)] {
        if !v.is_finite() || v <= 0.0 {
            return Err(BoothError::decode(format!("{name} must be finite and > 0")));
        }
    }
    for (name, v) in [("cell width", w), ("cell height", half)] {
        if !v.is_finite() || v <= 0.0 {
            return Err(BoothError::validation(format!("{name} must be finite and > 0")));
        }
    }

    let target_aspect = w / half;
    let source_aspect = vw / vh;

    Ok(if source_aspect > target_aspect {
        let sh = vh;
        let sw = vh * target_aspect;
        CropRect {
            sx: (vw - sw) / 2.0,
            sy: 0.0,
            sw,
            sh,
        }
    } else {
        let sw = vw;
        let sh = vw / target_aspect;
        CropRect {
            sx: 0.0,
            sy: (vh - sh) / 2.0,
            sw,
            sh,
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn landscape_1080p_crops_horizontally() {
        let c = crop_to_fit(1920.0, 1080.0, 1176.0, 735.0).unwrap();
        assert!(close(c.sh, 1080.0));
        assert!(close(c.sw, 1728.0));
        assert!(close(c.sx, 96.0));
        assert_eq!(c.sy, 0.0);
    }

    #[test]
    fn portrait_source_crops_vertically() {
        let c = crop_to_fit(1080.0, 1920.0, 1176.0, 735.0).unwrap();
        assert_eq!(c.sx, 0.0);
        assert!(close(c.sw, 1080.0));
        assert!(close(c.sh, 675.0));
        assert!(close(c.sy, (1920.0 - 675.0) / 2.0));
    }

    #[test]
    fn equal_aspect_keeps_whole_source() {
        let c = crop_to_fit(1600.0, 1000.0, 1176.0, 735.0).unwrap();
        assert!(close(c.sx, 0.0));
        assert!(close(c.sy, 0.0));
        assert!(close(c.sw, 1600.0));
        assert!(close(c.sh, 1000.0));
    }

    #[test]
    fn crop_preserves_target_aspect_for_many_sources() {
        for (vw, vh) in [(640.0, 480.0), (2560.0, 1440.0), (500.0, 2000.0), (1.0, 1.0)] {
            let c = crop_to_fit(vw, vh, 1176.0, 735.0).unwrap();
            assert!(close(c.sw / c.sh, 1176.0 / 735.0));
            assert!(c.sx >= 0.0 && c.sy >= 0.0);
            assert!(close(c.sx * 2.0 + c.sw, vw) || close(c.sy * 2.0 + c.sh, vh));
            assert!(c.sw <= vw + 1e-9 && c.sh <= vh + 1e-9);
        }
    }

    #[test]
    fn zero_sized_source_is_rejected() {
        assert!(crop_to_fit(0.0, 10.0, 1176.0, 735.0).is_err());
        assert!(crop_to_fit(10.0, f64::NAN, 1176.0, 735.0).is_err());
    }
}
