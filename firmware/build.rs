fn main() {
    // Wi-Fi secrets and NTP overrides are injected from the build
    // environment and read with `option_env!`; never commit them.
    for var in ["WIFI_SSID", "WIFI_PASS", "NTP_SERVER", "UTC_OFFSET_HOURS"] {
        println!("cargo:rerun-if-env-changed={var}");
    }

    #[cfg(feature = "espidf")]
    embuild::espidf::sysenv::output();
}
