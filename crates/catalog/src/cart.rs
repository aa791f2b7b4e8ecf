use serde::{Deserialize, Serialize};

use storefront_core::LessonId;

/// Cart line: a pending quantity of one lesson, not yet committed to an order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: LessonId,
    pub quantity: u32,
}

/// Cart: at most one line per lesson, in the order lessons were first added.
///
/// Mutators are crate-private: the cart only changes through
/// [`Storefront::apply`](crate::Storefront), after the lesson service confirmed
/// the matching availability update.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cart {
    lines: Vec<CartLine>,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> &[CartLine] {
        &self.lines
    }

    pub fn line(&self, item_id: &LessonId) -> Option<&CartLine> {
        self.lines.iter().find(|l| &l.item_id == item_id)
    }

    pub fn quantity_of(&self, item_id: &LessonId) -> u32 {
        self.line(item_id).map_or(0, |l| l.quantity)
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Total number of reserved spaces across all lines.
    pub fn item_count(&self) -> u32 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    pub(crate) fn add(&mut self, item_id: &LessonId, quantity: u32) {
        match self.lines.iter_mut().find(|l| &l.item_id == item_id) {
            Some(line) => line.quantity += quantity,
            None => self.lines.push(CartLine {
                item_id: item_id.clone(),
                quantity,
            }),
        }
    }

    /// Release `quantity` from a line, dropping the line when it reaches zero.
    pub(crate) fn release(&mut self, item_id: &LessonId, quantity: u32) {
        if let Some(pos) = self.lines.iter().position(|l| &l.item_id == item_id) {
            let line = &mut self.lines[pos];
            line.quantity = line.quantity.saturating_sub(quantity);
            if line.quantity == 0 {
                self.lines.remove(pos);
            }
        }
    }

    pub(crate) fn retain(&mut self, mut keep: impl FnMut(&CartLine) -> bool) {
        self.lines.retain(|l| keep(l));
    }

    pub(crate) fn clear(&mut self) {
        self.lines.clear();
    }
}
