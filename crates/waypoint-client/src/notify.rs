// SPDX-License-Identifier: Apache-2.0

/// User-facing notification sink. High-frequency structural edits pass
/// `silent` to suppress the success path.
pub trait Notifier: Send + Sync {
    fn success(&self, message: &str);
    fn failure(&self, message: &str);
}

#[derive(Debug, Default, Clone, Copy)]
pub struct NullNotifier;

impl Notifier for NullNotifier {
    fn success(&self, _message: &str) {}
    fn failure(&self, _message: &str) {}
}
