use std::future::Future;

use crate::runtime_env::Platform;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum WindowPresence {
    #[default]
    NoWindow,
    Open,
    Minimized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    Ready,
    WindowCreated,
    WindowDestroyed,
    Minimized,
    Restored,
    SecondInstance,
    AllWindowsClosed,
    Reactivate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleAction {
    None,
    CreateWindow,
    RestoreAndFocus,
    Focus,
    CleanupThenExit,
    StayResident,
}

/// Tracks the main window so lifecycle callbacks decide from owned state
/// instead of probing the window manager.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WindowLifecycle {
    platform: Platform,
    presence: WindowPresence,
}

impl WindowLifecycle {
    pub fn new(platform: Platform) -> Self {
        Self {
            platform,
            presence: WindowPresence::NoWindow,
        }
    }

    pub fn presence(&self) -> WindowPresence {
        self.presence
    }

    pub fn handle(&mut self, event: LifecycleEvent) -> LifecycleAction {
        match (event, self.presence) {
            (LifecycleEvent::Ready, WindowPresence::NoWindow) => LifecycleAction::CreateWindow,
            (LifecycleEvent::Ready, _) => LifecycleAction::Focus,
            (LifecycleEvent::WindowCreated, _) | (LifecycleEvent::Restored, _) => {
                self.presence = WindowPresence::Open;
                LifecycleAction::None
            }
            (LifecycleEvent::WindowDestroyed, _) => {
                self.presence = WindowPresence::NoWindow;
                LifecycleAction::None
            }
            (LifecycleEvent::Minimized, WindowPresence::NoWindow) => LifecycleAction::None,
            (LifecycleEvent::Minimized, _) => {
                self.presence = WindowPresence::Minimized;
                LifecycleAction::None
            }
            (LifecycleEvent::SecondInstance, WindowPresence::NoWindow) => LifecycleAction::None,
            (LifecycleEvent::SecondInstance, _) => {
                self.presence = WindowPresence::Open;
                LifecycleAction::RestoreAndFocus
            }
            (LifecycleEvent::AllWindowsClosed, _) => {
                self.presence = WindowPresence::NoWindow;
                if self.platform.keeps_running_without_windows() {
                    LifecycleAction::StayResident
                } else {
                    LifecycleAction::CleanupThenExit
                }
            }
            (LifecycleEvent::Reactivate, WindowPresence::NoWindow) => LifecycleAction::CreateWindow,
            (LifecycleEvent::Reactivate, _) => {
                self.presence = WindowPresence::Open;
                LifecycleAction::RestoreAndFocus
            }
        }
    }
}

/// Awaits `cleanup` to completion before handing control to `exit`.
pub async fn cleanup_then_exit<C, E>(cleanup: C, exit: E)
where
    C: Future<Output = ()>,
    E: FnOnce(),
{
    cleanup.await;
    exit();
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, time::Duration};

    use super::*;

    fn opened(platform: Platform) -> WindowLifecycle {
        let mut lifecycle = WindowLifecycle::new(platform);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Ready),
            LifecycleAction::CreateWindow
        );
        lifecycle.handle(LifecycleEvent::WindowCreated);
        lifecycle
    }

    #[test]
    fn second_instance_restores_minimized_window_without_creating_another() {
        let mut lifecycle = opened(Platform::Windows);
        lifecycle.handle(LifecycleEvent::Minimized);
        assert_eq!(lifecycle.presence(), WindowPresence::Minimized);

        assert_eq!(
            lifecycle.handle(LifecycleEvent::SecondInstance),
            LifecycleAction::RestoreAndFocus
        );
        assert_eq!(lifecycle.presence(), WindowPresence::Open);
    }

    #[test]
    fn second_instance_without_window_does_nothing() {
        let mut lifecycle = WindowLifecycle::new(Platform::Linux);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::SecondInstance),
            LifecycleAction::None
        );
        assert_eq!(lifecycle.presence(), WindowPresence::NoWindow);
    }

    #[test]
    fn all_windows_closed_exits_outside_macos() {
        for platform in [Platform::Windows, Platform::Linux] {
            let mut lifecycle = opened(platform);
            assert_eq!(
                lifecycle.handle(LifecycleEvent::AllWindowsClosed),
                LifecycleAction::CleanupThenExit
            );
            assert_eq!(lifecycle.presence(), WindowPresence::NoWindow);
        }
    }

    #[test]
    fn all_windows_closed_stays_resident_on_macos_and_reactivate_recreates() {
        let mut lifecycle = opened(Platform::MacOs);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::AllWindowsClosed),
            LifecycleAction::StayResident
        );
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Reactivate),
            LifecycleAction::CreateWindow
        );
    }

    #[test]
    fn reactivate_with_window_focuses_it() {
        let mut lifecycle = opened(Platform::MacOs);
        lifecycle.handle(LifecycleEvent::Minimized);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Reactivate),
            LifecycleAction::RestoreAndFocus
        );
        assert_eq!(lifecycle.presence(), WindowPresence::Open);
    }

    #[test]
    fn destroyed_main_window_is_recreated_on_reactivate() {
        let mut lifecycle = opened(Platform::MacOs);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::WindowDestroyed),
            LifecycleAction::None
        );
        assert_eq!(lifecycle.presence(), WindowPresence::NoWindow);
        assert_eq!(
            lifecycle.handle(LifecycleEvent::Reactivate),
            LifecycleAction::CreateWindow
        );
    }

    #[test]
    fn ready_with_existing_window_only_focuses() {
        let mut lifecycle = opened(Platform::Linux);
        assert_eq!(lifecycle.handle(LifecycleEvent::Ready), LifecycleAction::Focus);
    }

    #[tokio::test]
    async fn cleanup_completes_before_exit() {
        let order = RefCell::new(Vec::new());
        cleanup_then_exit(
            async {
                order.borrow_mut().push("cleanup started");
                tokio::time::sleep(Duration::from_millis(20)).await;
                order.borrow_mut().push("cleanup finished");
            },
            || order.borrow_mut().push("exit"),
        )
        .await;

        assert_eq!(
            order.into_inner(),
            vec!["cleanup started", "cleanup finished", "exit"]
        );
    }
}
