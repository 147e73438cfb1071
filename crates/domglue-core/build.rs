use cfg_aliases::cfg_aliases;

fn main() {
	// Declare custom cfg to avoid warnings in Rust 2024 edition
	println!("cargo::rustc-check-cfg=cfg(browser)");
	println!("cargo::rustc-check-cfg=cfg(simulated)");

	cfg_aliases! {
		// Real JavaScript host, bound through wasm-bindgen
		browser: { all(target_arch = "wasm32", target_os = "unknown") },
		// In-process object heap used by native builds and tests
		simulated: { not(all(target_arch = "wasm32", target_os = "unknown")) },
	}
}
