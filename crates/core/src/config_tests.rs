// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn runtime_adapter_kind_parses_its_own_display_form() {
    for kind in RuntimeAdapterKind::ALL {
        assert_eq!(RuntimeAdapterKind::parse(&kind.to_string()), Some(kind));
    }
}

#[test]
fn runtime_adapter_kind_rejects_unknown_names() {
    assert_eq!(RuntimeAdapterKind::parse("gpt_cli"), None);
}

#[test]
fn default_switchboard_url_matches_the_documented_default() {
    assert_eq!(ButlerConfig::DEFAULT_SWITCHBOARD_URL, "http://localhost:40200");
}
