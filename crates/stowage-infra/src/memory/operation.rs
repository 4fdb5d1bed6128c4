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

use super::ProviderState;
use std::sync::{Arc, Mutex};
use stowage_core::provider::{
    DownloadStatus, HandleId, OperationEvent, OperationEventKind, OperationState,
    ProviderOperation,
};
use stowage_core::ProviderError;

pub(crate) type Finish<T> =
    Box<dyn FnOnce(&mut ProviderState, HandleId) -> Result<T, ProviderError> + Send>;

/// An operation that completes after a fixed number of ticks.
///
/// The outcome is computed against the provider state at completion time,
/// so failures injected while the operation is pending still apply.
pub(crate) struct MemoryOperation<T> {
    handle: HandleId,
    name: String,
    shared: Arc<Mutex<ProviderState>>,
    ticks_total: u32,
    ticks_done: u32,
    total_bytes: u64,
    finish: Option<Finish<T>>,
}

impl<T> MemoryOperation<T> {
    pub(crate) fn new(
        handle: HandleId,
        name: String,
        shared: Arc<Mutex<ProviderState>>,
        ticks: u32,
        total_bytes: u64,
        finish: Finish<T>,
    ) -> Self {
        Self {
            handle,
            name,
            shared,
            ticks_total: ticks.max(1),
            ticks_done: 0,
            total_bytes,
            finish: Some(finish),
        }
    }

    fn notify(&self, error: Option<&ProviderError>) {
        let (handler, callbacks) = {
            let state = self.shared.lock().unwrap_or_else(|p| p.into_inner());
            let callbacks: Vec<_> = state.callbacks.iter().map(|(_, cb)| Arc::clone(cb)).collect();
            (state.exception_handler.clone(), callbacks)
        };

        let event = OperationEvent {
            handle: self.handle,
            name: self.name.clone(),
            kind: match error {
                Some(_) => OperationEventKind::Failed,
                None => OperationEventKind::Complete,
            },
        };
        for callback in callbacks {
            callback(&event);
        }
        if let (Some(handler), Some(error)) = (handler, error) {
            handler(self.handle, error);
        }
    }
}

impl<T: Send> ProviderOperation<T> for MemoryOperation<T> {
    fn handle(&self) -> HandleId {
        self.handle
    }

    fn debug_name(&self) -> &str {
        &self.name
    }

    fn poll_step(&mut self) -> OperationState<T> {
        if self.finish.is_none() {
            return OperationState::Complete(Err(ProviderError::Failed(format!(
                "{} was polled after completion",
                self.name
            ))));
        }

        self.ticks_done += 1;
        if self.ticks_done < self.ticks_total {
            return OperationState::Pending;
        }

        let Some(finish) = self.finish.take() else {
            return OperationState::Pending;
        };
        let result = {
            let mut state = self.shared.lock().unwrap_or_else(|p| p.into_inner());
            finish(&mut state, self.handle)
        };
        self.notify(result.as_ref().err());
        OperationState::Complete(result)
    }

    fn percent_complete(&self) -> f32 {
        self.ticks_done as f32 / self.ticks_total as f32
    }

    fn download_status(&self) -> DownloadStatus {
        DownloadStatus {
            downloaded_bytes: self.total_bytes * u64::from(self.ticks_done)
                / u64::from(self.ticks_total),
            total_bytes: self.total_bytes,
        }
    }
}
