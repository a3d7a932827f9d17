use core::ops::{Deref, DerefMut};
use embedded_storage::nor_flash::NorFlash;

/// Flash access plus interrupt control. See README.md for an example implementation.
pub trait Platform: Interrupts + NorFlash {}

impl<T: Interrupts + NorFlash> Platform for T {}

/// Masks interrupts while the settings region is erased and programmed, so that no code runs
/// from or reads the flash in between.
pub trait Interrupts {
    /// Whatever is needed to restore the previous interrupt state.
    type Token;

    fn mask(&mut self) -> Self::Token;

    fn restore(&mut self, token: Self::Token);
}

impl<T: Interrupts> Interrupts for &mut T {
    type Token = T::Token;

    fn mask(&mut self) -> Self::Token {
        T::mask(self)
    }

    fn restore(&mut self, token: Self::Token) {
        T::restore(self, token)
    }
}

/// Scoped interrupt mask. Dereferences to the wrapped flash and restores the interrupt state on
/// drop, including early returns on flash errors.
pub(crate) struct InterruptGuard<'a, T: Interrupts> {
    hal: &'a mut T,
    token: Option<T::Token>,
}

impl<'a, T: Interrupts> InterruptGuard<'a, T> {
    pub(crate) fn new(hal: &'a mut T, mask: bool) -> Self {
        let token = mask.then(|| hal.mask());
        Self { hal, token }
    }
}

impl<T: Interrupts> Deref for InterruptGuard<'_, T> {
    type Target = T;

    fn deref(&self) -> &Self::Target {
        self.hal
    }
}

impl<T: Interrupts> DerefMut for InterruptGuard<'_, T> {
    fn deref_mut(&mut self) -> &mut Self::Target {
        self.hal
    }
}

impl<T: Interrupts> Drop for InterruptGuard<'_, T> {
    fn drop(&mut self) {
        if let Some(token) = self.token.take() {
            self.hal.restore(token);
        }
    }
}

#[cfg(any(
    feature = "esp32",
    feature = "esp32s2",
    feature = "esp32s3",
    feature = "esp32c2",
    feature = "esp32c3",
    feature = "esp32c6",
    feature = "esp32h2",
))]
mod chip {
    use esp_storage::FlashStorage;

    use crate::platform::Interrupts;

    // esp-hal provides the critical-section implementation for all supported chips
    impl Interrupts for FlashStorage<'_> {
        type Token = critical_section::RestoreState;

        fn mask(&mut self) -> Self::Token {
            // SAFETY: every acquire is paired with a release by `InterruptGuard`
            unsafe { critical_section::acquire() }
        }

        fn restore(&mut self, token: Self::Token) {
            // SAFETY: `token` comes from the matching `acquire` in `mask`
            unsafe { critical_section::release(token) }
        }
    }
}
