//! Lightbox index navigation.

use super::keyboard::{BindingId, KeyBindingHost, LightboxCommand, LightboxKey};
use crate::gallery::CandidatePhoto;

/// Tracks the open/closed state and the focused index of the lightbox.
///
/// Navigation wraps in both directions. Key bindings are held only while the
/// lightbox is open.
#[derive(Debug, Default)]
pub struct LightboxNavigator {
    index: Option<usize>,
    len: usize,
    binding: Option<BindingId>,
}

impl LightboxNavigator {
    pub fn new(len: usize) -> Self {
        Self {
            index: None,
            len,
            binding: None,
        }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn is_open(&self) -> bool {
        self.index.is_some()
    }

    /// Focused index, if open.
    pub fn current(&self) -> Option<usize> {
        self.index
    }

    /// Opens at `index` (wrapped into range) and binds the navigation keys.
    ///
    /// Opening an empty list does nothing and returns `None`.
    pub fn open(&mut self, index: usize, host: &mut dyn KeyBindingHost) -> Option<usize> {
        if self.len == 0 {
            return None;
        }
        let index = index % self.len;
        self.index = Some(index);
        if self.binding.is_none() {
            self.binding = Some(host.bind(&LightboxKey::ALL));
        }
        Some(index)
    }

    /// Closes the lightbox and releases the key bindings.
    pub fn close(&mut self, host: &mut dyn KeyBindingHost) {
        self.index = None;
        if let Some(id) = self.binding.take() {
            host.unbind(id);
        }
    }

    /// Moves focus to `target`, wrapped modulo the list length.
    ///
    /// Ignored while closed.
    pub fn navigate(&mut self, target: i64) -> Option<usize> {
        self.index?;
        if self.len == 0 {
            return None;
        }
        let wrapped = target.rem_euclid(self.len as i64) as usize;
        self.index = Some(wrapped);
        self.index
    }

    pub fn next(&mut self) -> Option<usize> {
        let current = self.index?;
        self.navigate(current as i64 + 1)
    }

    pub fn previous(&mut self) -> Option<usize> {
        let current = self.index?;
        self.navigate(current as i64 - 1)
    }

    /// Applies a key press. Returns the command that was applied, or `None`
    /// when the lightbox is closed.
    pub fn handle_key(
        &mut self,
        key: LightboxKey,
        host: &mut dyn KeyBindingHost,
    ) -> Option<LightboxCommand> {
        if !self.is_open() {
            return None;
        }
        let command = key.command();
        match command {
            LightboxCommand::Previous => {
                self.previous();
            }
            LightboxCommand::Next => {
                self.next();
            }
            LightboxCommand::Close => self.close(host),
        }
        Some(command)
    }

    /// Updates the list length after a reload. An empty list closes the
    /// lightbox; a shorter list clamps the focus to the last photo.
    pub fn set_len(&mut self, len: usize, host: &mut dyn KeyBindingHost) {
        self.len = len;
        if len == 0 {
            self.close(host);
            return;
        }
        if let Some(index) = self.index
            && index >= len
        {
            self.index = Some(len - 1);
        }
    }

    /// The photo under focus, used as the target of selection mutations.
    pub fn focused_photo<'a>(&self, photos: &'a [CandidatePhoto]) -> Option<&'a CandidatePhoto> {
        self.index.and_then(|i| photos.get(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lightbox::KeyBindingRegistry;

    fn photos(n: usize) -> Vec<CandidatePhoto> {
        (0..n)
            .map(|i| CandidatePhoto {
                id: format!("p{}", i),
                name: format!("IMG_{:04}.jpg", i),
                thumbnail_url: format!("https://cdn.test/thumb/{}", i),
                full_res_url: format!("https://cdn.test/full/{}", i),
            })
            .collect()
    }

    #[test]
    fn test_previous_wraps_to_last() {
        let mut host = KeyBindingRegistry::new();
        let mut nav = LightboxNavigator::new(10);
        nav.open(0, &mut host);

        assert_eq!(nav.previous(), Some(9));
        assert_eq!(nav.next(), Some(0));
    }

    #[test]
    fn test_navigate_is_modular_both_ways() {
        let mut host = KeyBindingRegistry::new();
        let mut nav = LightboxNavigator::new(4);
        nav.open(1, &mut host);

        assert_eq!(nav.navigate(-1), Some(3));
        assert_eq!(nav.navigate(9), Some(1));
        assert_eq!(nav.navigate(-8), Some(0));
    }

    #[test]
    fn test_closed_navigator_ignores_navigation_and_keys() {
        let mut host = KeyBindingRegistry::new();
        let mut nav = LightboxNavigator::new(3);

        assert_eq!(nav.next(), None);
        assert_eq!(nav.handle_key(LightboxKey::ArrowRight, &mut host), None);
        assert_eq!(host.active_count(), 0);
    }

    #[test]
    fn test_open_binds_and_escape_unbinds() {
        let mut host = KeyBindingRegistry::new();
        let mut nav = LightboxNavigator::new(3);

        nav.open(2, &mut host);
        assert_eq!(host.active_count(), 1);

        // Re-opening on another photo keeps the single binding.
        nav.open(0, &mut host);
        assert_eq!(host.active_count(), 1);

        assert_eq!(
            nav.handle_key(LightboxKey::Escape, &mut host),
            Some(LightboxCommand::Close)
        );
        assert!(!nav.is_open());
        assert_eq!(host.active_count(), 0);
    }

    #[test]
    fn test_arrow_keys_move_focus() {
        let mut host = KeyBindingRegistry::new();
        let list = photos(3);
        let mut nav = LightboxNavigator::new(list.len());
        nav.open(0, &mut host);

        nav.handle_key(LightboxKey::ArrowLeft, &mut host);
        assert_eq!(nav.focused_photo(&list).map(|p| p.id.as_str()), Some("p2"));

        nav.handle_key(LightboxKey::ArrowRight, &mut host);
        assert_eq!(nav.focused_photo(&list).map(|p| p.id.as_str()), Some("p0"));
    }

    #[test]
    fn test_empty_list_closes_and_releases_binding() {
        let mut host = KeyBindingRegistry::new();
        let mut nav = LightboxNavigator::new(5);
        nav.open(4, &mut host);

        nav.set_len(0, &mut host);

        assert!(!nav.is_open());
        assert_eq!(host.active_count(), 0);
        assert_eq!(nav.open(0, &mut host), None);
    }

    #[test]
    fn test_shrinking_list_clamps_focus() {
        let mut host = KeyBindingRegistry::new();
        let mut nav = LightboxNavigator::new(5);
        nav.open(4, &mut host);

        nav.set_len(2, &mut host);

        assert_eq!(nav.current(), Some(1));
    }
}
