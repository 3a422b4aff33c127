//! Text editing of numeric property values.
//!
//! A [`NumberField`] keeps the text the user is typing separate from the
//! committed property value. Nothing reaches the store until the field is
//! blurred (Enter, Escape or focus moving away): valid text is reformatted
//! and committed, invalid text reverts to the last committed value. The
//! arrow keys step the value and commit at once.

use tracing::debug;

use crate::arena::NodeId;
use crate::error::{GraphError, GraphResult};
use crate::project::TypedValue;
use crate::store::Store;

/// Keys the field reacts to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldKey {
    /// Commit and blur.
    Enter,
    /// Blur; commits like Enter.
    Escape,
    /// Step up.
    ArrowUp,
    /// Step down.
    ArrowDown,
}

/// Step applied by the arrow keys, and with shift held.
const STEP: f64 = 1.0;
const SHIFT_STEP: f64 = 10.0;

/// Format a value with at most two fraction digits, trailing zeros trimmed.
pub fn format_number(value: f64) -> String {
    let text = format!("{value:.2}");
    let text = text.trim_end_matches('0').trim_end_matches('.');
    if text == "-0" {
        "0".to_string()
    } else {
        text.to_string()
    }
}

/// Parse user input. Surrounding whitespace is ignored; non-finite values
/// are rejected.
pub fn parse_number(text: &str) -> Option<f64> {
    text.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

/// Edit state of one numeric property.
#[derive(Clone, Debug, PartialEq)]
pub struct NumberField {
    property_id: NodeId,
    text: String,
    committed: f64,
}

impl NumberField {
    /// Field showing the current value of `property_id`.
    pub fn for_property(store: &Store, property_id: NodeId) -> GraphResult<Self> {
        let value = store.property(property_id)?.value.clone();
        let committed = value.as_number().ok_or(GraphError::ValueTypeMismatch {
            id: property_id,
            expected: "number",
            found: value.kind_name(),
        })?;
        Ok(Self {
            property_id,
            text: format_number(committed),
            committed,
        })
    }

    /// Property being edited.
    pub fn property_id(&self) -> NodeId {
        self.property_id
    }

    /// Text currently shown.
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Last value written to the store.
    pub fn committed(&self) -> f64 {
        self.committed
    }

    /// Replace the edit text. Nothing is committed yet.
    pub fn input(&mut self, text: impl Into<String>) {
        self.text = text.into();
    }

    /// React to a key press.
    pub fn key(&mut self, store: &mut Store, key: FieldKey, shift: bool) -> GraphResult<()> {
        let step = if shift { SHIFT_STEP } else { STEP };
        match key {
            FieldKey::Enter | FieldKey::Escape => self.blur(store),
            FieldKey::ArrowUp => self.commit(store, self.committed + step),
            FieldKey::ArrowDown => self.commit(store, self.committed - step),
        }
    }

    /// Commit the edit text if it parses, otherwise revert it.
    pub fn blur(&mut self, store: &mut Store) -> GraphResult<()> {
        match parse_number(&self.text) {
            Some(value) => self.commit(store, value),
            None => {
                debug!(property_id = %self.property_id, text = %self.text, "Reverting invalid number");
                self.text = format_number(self.committed);
                Ok(())
            }
        }
    }

    /// Pick up a value changed elsewhere, discarding uncommitted text.
    pub fn refresh(&mut self, store: &Store) -> GraphResult<()> {
        *self = Self::for_property(store, self.property_id)?;
        Ok(())
    }

    fn commit(&mut self, store: &mut Store, value: f64) -> GraphResult<()> {
        if value != self.committed {
            store.set_property_value(self.property_id, TypedValue::Number(value))?;
            self.committed = value;
        }
        self.text = format_number(value);
        Ok(())
    }
}
