#![no_main]

use std::path::{Component, Path};

use libfuzzer_sys::fuzz_target;
use onboard_capabilities::contain_name;

fuzz_target!(|data: &[u8]| {
    let name = String::from_utf8_lossy(data);
    let dir = Path::new("/var/lib/onboard/downloads");
    if let Ok(path) = contain_name(dir, &name) {
        assert!(path.starts_with(dir));
        assert!(path
            .components()
            .all(|component| !matches!(component, Component::ParentDir)));
    }
});
