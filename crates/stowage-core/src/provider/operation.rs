// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use super::{ContentProvider, HandleGuard, HandleId};
use crate::error::ProviderError;
use std::sync::Arc;

/// A snapshot of a dependency download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DownloadStatus {
    /// Bytes received so far.
    pub downloaded_bytes: u64,
    /// Bytes the download needs in total. Zero means nothing to download.
    pub total_bytes: u64,
}

impl DownloadStatus {
    /// `downloaded / total`, clamped to `[0, 1]`. Nothing to download counts as complete.
    pub fn percent(&self) -> f32 {
        if self.total_bytes == 0 {
            return 1.0;
        }
        (self.downloaded_bytes as f64 / self.total_bytes as f64).clamp(0.0, 1.0) as f32
    }
}

/// The result of advancing an operation by one step.
#[derive(Debug)]
pub enum OperationState<T> {
    /// The operation needs more ticks.
    Pending,
    /// The operation finished. Its result is handed out exactly once.
    Complete(Result<T, ProviderError>),
}

/// An asynchronous provider operation, modelled as a pollable state machine.
pub trait ProviderOperation<T>: Send {
    /// The provider handle allocated for this operation.
    fn handle(&self) -> HandleId;

    /// A debug name such as `DownloadDependencies(scenes/level1)`.
    fn debug_name(&self) -> &str;

    /// Advances the operation by one scheduling tick.
    fn poll_step(&mut self) -> OperationState<T>;

    /// Progress of the operation in `[0, 1]`.
    fn percent_complete(&self) -> f32;

    /// Byte-level progress, for operations that transfer data.
    fn download_status(&self) -> DownloadStatus {
        DownloadStatus::default()
    }
}

/// A boxed, sendable provider operation.
pub type BoxedOperation<T> = Box<dyn ProviderOperation<T> + Send>;

/// Drives `operation` to completion, yielding to the scheduler between ticks.
///
/// `on_tick` observes the operation after every step that left it pending.
/// The returned guard owns the operation's handle; dropping it releases the
/// handle, keeping it keeps the handle live.
pub async fn drive<T, F>(
    provider: &Arc<dyn ContentProvider>,
    mut operation: BoxedOperation<T>,
    mut on_tick: F,
) -> (HandleGuard, Result<T, ProviderError>)
where
    T: Send,
    F: FnMut(&dyn ProviderOperation<T>) + Send,
{
    let guard = HandleGuard::new(operation.handle(), Arc::clone(provider));
    loop {
        match operation.poll_step() {
            OperationState::Pending => {
                on_tick(operation.as_ref());
                tokio::task::yield_now().await;
            }
            OperationState::Complete(result) => {
                log::trace!("{} finished ({})", operation.debug_name(), guard.id());
                return (guard, result);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn percent_is_clamped() {
        let over = DownloadStatus {
            downloaded_bytes: 300,
            total_bytes: 200,
        };
        assert_eq!(over.percent(), 1.0);

        let half = DownloadStatus {
            downloaded_bytes: 50,
            total_bytes: 100,
        };
        assert!((half.percent() - 0.5).abs() < f32::EPSILON);
    }

    #[test]
    fn nothing_to_download_is_complete() {
        assert_eq!(DownloadStatus::default().percent(), 1.0);
    }
}
