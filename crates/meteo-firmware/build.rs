//! Exports `METEO_*` settings from `.env` to the firmware at compile time
//! and adds the esp-hal linker script.

fn main() {
    println!("cargo:rerun-if-changed=.env");

    match dotenvy::dotenv_iter() {
        Ok(iter) => {
            for (key, value) in iter.flatten() {
                if key.starts_with("METEO_") {
                    println!("cargo:rerun-if-env-changed={key}");
                    println!("cargo:rustc-env={key}={value}");
                }
            }
        }
        Err(_) => println!("cargo:warning=no .env file found, using default settings"),
    }

    println!("cargo:rustc-link-arg=-Tlinkall.x");
}
