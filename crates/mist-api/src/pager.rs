/// Turns a "sentinel element is visible" signal into load-next requests.
///
/// A load is requested when the observed `(visible, has_more, in_flight)`
/// triple changes while the sentinel is visible, more pages exist and
/// nothing is in flight. A `true` answer is taken to start a fetch, so the
/// sentinel staying visible while that fetch is pending never asks again.
/// Once it settles, the next observation of the still-visible sentinel asks
/// for exactly one more page.
#[derive(Debug, Default, Clone)]
pub struct ViewportPager {
    last: Option<(bool, bool, bool)>,
}

impl ViewportPager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an observation; returns true if the caller should load the next page.
    pub fn observe(&mut self, visible: bool, has_more: bool, in_flight: bool) -> bool {
        let changed = self.last != Some((visible, has_more, in_flight));
        let load = changed && visible && has_more && !in_flight;
        self.last = Some((visible, has_more, in_flight || load));
        load
    }

    /// Forget the previous observation (the list it belonged to is gone).
    pub fn reset(&mut self) {
        self.last = None;
    }
}
