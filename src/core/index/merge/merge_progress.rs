// Copyright 2019 Zhizhesihai (Beijing) Technology Limited.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// See the License for the specific language governing permissions and
// limitations under the License.

use core::index::ErrorKind::MergeAborted;
use error::{Error, ErrorKind, Result};

use std::sync::atomic::{AtomicBool, Ordering};

/// Abort flag of one running merge.
///
/// The merge thread polls `check_aborted` between units of work; any other
/// thread may call `abort`. Once set the flag never clears.
#[derive(Debug, Default)]
pub struct OneMergeProgress {
    aborted: AtomicBool,
}

impl OneMergeProgress {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn abort(&self) {
        self.aborted.store(true, Ordering::Release);
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted.load(Ordering::Acquire)
    }

    pub fn check_aborted(&self) -> Result<()> {
        if self.is_aborted() {
            bail!(ErrorKind::Index(MergeAborted("merge is aborted".into())));
        }
        Ok(())
    }
}

/// Result of a merge that may have been aborted midway.
#[derive(Debug)]
pub enum MergeOutcome<T> {
    Completed(T),
    Aborted,
}

impl<T> MergeOutcome<T> {
    pub fn is_aborted(&self) -> bool {
        match self {
            MergeOutcome::Aborted => true,
            MergeOutcome::Completed(_) => false,
        }
    }

    pub fn completed(self) -> Option<T> {
        match self {
            MergeOutcome::Completed(t) => Some(t),
            MergeOutcome::Aborted => None,
        }
    }
}

pub fn is_merge_aborted(err: &Error) -> bool {
    match err.kind() {
        ErrorKind::Index(MergeAborted(_)) => true,
        _ => false,
    }
}
