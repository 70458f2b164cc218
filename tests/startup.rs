use std::process::{Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

/// A required Redis that cannot be reached must stop the binary before it
/// binds a port.
#[test]
fn required_unreachable_cache_aborts_startup() {
    let mut child = Command::new(env!("CARGO_BIN_EXE_image_combiner"))
        .env("OPTIONS_PATH", "/nonexistent/options.json")
        .env("ENABLE_CACHE", "true")
        .env("REDIS_REQUIRED", "true")
        .env("REDIS_HOST", "127.0.0.1")
        .env("REDIS_PORT", "1")
        .env("PORT", "0")
        .env("RUST_LOG", "error")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .unwrap();

    let deadline = Instant::now() + Duration::from_secs(15);
    let status = loop {
        if let Some(status) = child.try_wait().unwrap() {
            break status;
        }
        if Instant::now() > deadline {
            child.kill().ok();
            panic!("server kept running with an unreachable required cache");
        }
        thread::sleep(Duration::from_millis(100));
    };

    assert!(!status.success());
}

#[test]
fn invalid_configuration_aborts_startup() {
    let status = Command::new(env!("CARGO_BIN_EXE_image_combiner"))
        .env("OPTIONS_PATH", "/nonexistent/options.json")
        .env("MAX_IMAGES", "9")
        .env("ENABLE_CACHE", "false")
        .env("RUST_LOG", "error")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    assert!(!status.success());
}

#[test]
fn options_file_takes_precedence_over_environment() {
    // The file is invalid and the environment is valid: startup can only
    // fail if the binary actually read the file.
    let path = std::env::temp_dir().join(format!(
        "image_combiner_startup_{}.json",
        std::process::id()
    ));
    std::fs::write(&path, r#"{"max_images": 9, "enable_cache": false}"#).unwrap();

    let status = Command::new(env!("CARGO_BIN_EXE_image_combiner"))
        .env("OPTIONS_PATH", &path)
        .env("MAX_IMAGES", "2")
        .env("ENABLE_CACHE", "false")
        .env("RUST_LOG", "error")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .unwrap();

    std::fs::remove_file(&path).ok();
    assert!(!status.success());
}
