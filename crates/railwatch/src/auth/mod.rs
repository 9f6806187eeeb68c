// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! OAuth2 authorization-code flow: PKCE, token endpoint calls, refresh gate.

pub mod gate;
pub mod oauth;
pub mod pkce;
