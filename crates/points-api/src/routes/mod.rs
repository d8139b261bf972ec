// Copyright 2025 RISC Zero, Inc.
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

pub mod points;
pub mod referral;
pub mod snapshot;

use std::str::FromStr;

use alloy::primitives::Address;

use crate::handler::ApiError;

/// Fixed page size of all paginated endpoints.
pub const PAGE_LIMIT: u64 = 10;

/// Validate a holder path segment. Babylon (`bbn...`) addresses pass
/// through; anything else must be a valid EVM address. Returns the
/// lowercased form used for storage and lookups.
pub(crate) fn validate_holder(holder: &str) -> Result<String, ApiError> {
    if holder.is_empty() {
        return Err(ApiError::Validation("holder query is missing".to_string()));
    }
    if !holder.starts_with("bbn") && Address::from_str(holder).is_err() {
        return Err(ApiError::Validation("holder is invalid address".to_string()));
    }
    Ok(holder.to_lowercase())
}

/// Parse and lowercase an EVM address.
pub(crate) fn validate_evm_address(address: &str, field: &str) -> Result<String, ApiError> {
    Address::from_str(address)
        .map(|_| address.to_lowercase())
        .map_err(|_| ApiError::Validation(format!("{field} is invalid address")))
}

/// Checksummed display form where the address parses, raw otherwise
/// (Babylon addresses stay as-is).
pub(crate) fn display_address(address: &str) -> String {
    match Address::from_str(address) {
        Ok(parsed) => parsed.to_checksum(None),
        Err(_) => address.to_string(),
    }
}

pub(crate) fn validate_page(page: u64) -> Result<u64, ApiError> {
    if page < 1 {
        return Err(ApiError::Validation("Invalid page number".to_string()));
    }
    Ok(page)
}

pub(crate) fn total_pages(total_document: u64, limit: u64) -> u64 {
    if total_document == 0 {
        1
    } else {
        total_document.div_ceil(limit)
    }
}
