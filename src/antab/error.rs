// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at http://mozilla.org/MPL/2.0/.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum WriteAntabError {
    #[error("Couldn't create ANTAB file {file}: {err}")]
    Create { file: String, err: std::io::Error },

    #[error(transparent)]
    IO(#[from] std::io::Error),
}
