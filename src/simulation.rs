//! Simulation instances and the session that owns them.
//!
//! A [`SimulationInstance`] bundles one concentration field, one text mask
//! and the machinery to keep them in step. A [`Session`] holds the current
//! instance and replaces it wholesale whenever its reset key changes.
//! Replacement is the only way to start over; nothing is re-seeded in place.

use log::{debug, info};

use crate::error::SimulationError;
use crate::field::ConcentrationField;
use crate::mask::{TextMask, TextRasterizer, TextStyle};
use crate::params::ParamSource;
use crate::stepper::{FieldStepper, FrameStats};

/// Reference grid size (cells per side).
pub const DEFAULT_GRID: usize = 300;

/// One running simulation: a field, its text mask and a stepper.
#[derive(Debug)]
pub struct SimulationInstance {
    field: ConcentrationField,
    mask: TextMask,
    rasterizer: TextRasterizer,
    stepper: FieldStepper,
}

impl SimulationInstance {
    /// Create an instance with the field at rest and a blank mask.
    pub fn new(width: usize, height: usize) -> Result<Self, SimulationError> {
        let field = ConcentrationField::new(width, height)?;
        let mask = TextMask::new(width, height)?;
        info!("Created {}x{} simulation instance", width, height);
        Ok(Self {
            field,
            mask,
            rasterizer: TextRasterizer::new(),
            stepper: FieldStepper::new(),
        })
    }

    pub fn field(&self) -> &ConcentrationField {
        &self.field
    }

    pub fn field_mut(&mut self) -> &mut ConcentrationField {
        &mut self.field
    }

    pub fn mask(&self) -> &TextMask {
        &self.mask
    }

    /// Direct access to the mask, bypassing the rasterizer.
    ///
    /// The next text or style change redraws the mask from text again.
    pub fn mask_mut(&mut self) -> &mut TextMask {
        self.rasterizer.invalidate();
        &mut self.mask
    }

    /// Frames advanced on this instance.
    pub fn frames(&self) -> u64 {
        self.stepper.frames()
    }

    /// Redraw the mask if the text or style changed.
    ///
    /// Returns true if the mask was regenerated.
    pub fn set_text(&mut self, text: &str, style: &TextStyle) -> bool {
        let changed = self.rasterizer.update(text, style, &mut self.mask);
        if changed {
            debug!(
                "Regenerated text mask (revision {}, {} chars, {} {}px)",
                self.mask.revision(),
                text.chars().count(),
                style.font_family,
                style.font_size
            );
        }
        changed
    }

    pub fn advance_frame<P: ParamSource + ?Sized>(&mut self, params: &P) -> FrameStats {
        self.stepper.advance_frame(&mut self.field, &self.mask, params)
    }
}

/// Owner of the current instance, keyed by a reset token.
#[derive(Debug)]
pub struct Session {
    instance: SimulationInstance,
    width: usize,
    height: usize,
    reset_key: u64,
    generation: u64,
    text: String,
    style: TextStyle,
}

impl Session {
    pub fn new(width: usize, height: usize, style: TextStyle) -> Result<Self, SimulationError> {
        let mut instance = SimulationInstance::new(width, height)?;
        instance.set_text("", &style);
        Ok(Self {
            instance,
            width,
            height,
            reset_key: 0,
            generation: 0,
            text: String::new(),
            style,
        })
    }

    pub fn instance(&self) -> &SimulationInstance {
        &self.instance
    }

    pub fn instance_mut(&mut self) -> &mut SimulationInstance {
        &mut self.instance
    }

    /// Number of times the instance has been replaced.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn reset_key(&self) -> u64 {
        self.reset_key
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn style(&self) -> &TextStyle {
        &self.style
    }

    /// Set the seed text; the mask is regenerated immediately if it changed.
    pub fn set_text(&mut self, text: &str) -> bool {
        if self.text != text {
            self.text = text.to_string();
        }
        self.instance.set_text(&self.text, &self.style)
    }

    /// Set the text style; the mask is regenerated immediately if it changed.
    pub fn set_style(&mut self, style: &TextStyle) -> bool {
        if &self.style != style {
            self.style = style.clone();
        }
        self.instance.set_text(&self.text, &self.style)
    }

    /// Replace the instance if `key` differs from the last key seen.
    ///
    /// The fresh instance starts at rest with the current text drawn into
    /// its mask. On failure the previous instance is kept.
    pub fn sync_reset_key(&mut self, key: u64) -> Result<bool, SimulationError> {
        if key == self.reset_key {
            return Ok(false);
        }
        let mut fresh = SimulationInstance::new(self.width, self.height)?;
        fresh.set_text(&self.text, &self.style);
        self.instance = fresh;
        self.reset_key = key;
        self.generation += 1;
        info!("Simulation reset (generation {})", self.generation);
        Ok(true)
    }

    /// Replace the instance unconditionally.
    pub fn reset(&mut self) -> Result<(), SimulationError> {
        self.sync_reset_key(self.reset_key.wrapping_add(1)).map(|_| ())
    }

    pub fn advance_frame<P: ParamSource + ?Sized>(&mut self, params: &P) -> FrameStats {
        self.instance.advance_frame(params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::field::Cell;
    use crate::params::SimulationParams;

    #[test]
    fn test_instance_starts_at_rest() {
        let instance = SimulationInstance::new(16, 16).unwrap();
        assert!(instance.mask().is_blank());
        assert!(instance.field().current().iter().all(|c| *c == Cell::EMPTY));
        assert_eq!(instance.frames(), 0);
    }

    #[test]
    fn test_instance_rejects_bad_dimensions() {
        assert!(SimulationInstance::new(0, 0).is_err());
    }

    #[test]
    fn test_set_text_regenerates_once() {
        let mut instance = SimulationInstance::new(100, 100).unwrap();
        let style = TextStyle::default();
        assert!(instance.set_text("A", &style));
        assert!(!instance.set_text("A", &style));
        assert!(!instance.mask().is_blank());
    }

    #[test]
    fn test_mask_mut_forces_redraw() {
        let mut instance = SimulationInstance::new(50, 50).unwrap();
        let style = TextStyle::default();
        instance.set_text("", &style);
        instance.mask_mut().set(0, 0, 1.0);
        assert!(instance.set_text("", &style));
        assert!(instance.mask().is_blank());
    }

    #[test]
    fn test_session_reset_key_replaces_instance() {
        let mut session = Session::new(32, 32, TextStyle::default()).unwrap();
        session.set_text("x");
        session.advance_frame(&SimulationParams::default());
        assert!(session.instance().field().total_b() > 0.0);

        assert!(!session.sync_reset_key(0).unwrap());
        assert!(session.sync_reset_key(7).unwrap());
        assert_eq!(session.generation(), 1);
        assert_eq!(session.instance().frames(), 0);
        assert_eq!(session.instance().field().total_b(), 0.0);
        // Text carries over into the fresh mask
        assert!(!session.instance().mask().is_blank());
        assert!(!session.sync_reset_key(7).unwrap());
    }

    #[test]
    fn test_session_reset_bumps_key() {
        let mut session = Session::new(8, 8, TextStyle::default()).unwrap();
        session.reset().unwrap();
        session.reset().unwrap();
        assert_eq!(session.generation(), 2);
        assert_eq!(session.reset_key(), 2);
    }

    #[test]
    fn test_session_style_change_redraws() {
        let mut session = Session::new(64, 64, TextStyle::default()).unwrap();
        session.set_text("ab");
        let rev = session.instance().mask().revision();
        let style = TextStyle {
            use_caps: false,
            ..TextStyle::default()
        };
        assert!(session.set_style(&style));
        assert!(session.instance().mask().revision() > rev);
        assert!(!session.set_style(&style));
    }

    #[test]
    fn test_field_edits_through_session_are_stepped() {
        let mut session = Session::new(16, 16, TextStyle::default()).unwrap();
        session
            .instance_mut()
            .field_mut()
            .set_cell(8, 8, Cell::new(0.5, 0.5));
        assert!(session.instance().field().total_b() > 0.0);

        session.advance_frame(&SimulationParams::default().with_iterations(1));
        // No text, so only the edited cell and its near neighbors carry b
        let field = session.instance().field();
        assert!(field.cell(8, 8).b > 0.0);
        assert!(field.cell(7, 8).b > 0.0);
        assert_eq!(field.cell(0, 0).b, 0.0);
        assert_eq!(session.instance().frames(), 1);
    }
}
