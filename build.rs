use std::env;

fn main() {
    println!("cargo:rerun-if-changed=build.rs");

    // Host builds only carry the library and the simulator
    let target = env::var("TARGET").unwrap_or_default();
    if !target.contains("avr") {
        return;
    }

    // Configure for ATtiny13A
    println!("cargo:rustc-link-arg=-mmcu=attiny13a");
}
