use std::sync::LazyLock;

pub static REQWEST_CLIENT: LazyLock<reqwest::Client> = LazyLock::new(|| {
    reqwest::Client::builder()
        .user_agent(concat!(
            "aquatrack/",
            env!("CARGO_PKG_VERSION"),
            " (+https://github.com/cmobautomation/aquatrack)"
        ))
        .build()
        .expect("Unable to create reqwest client!")
});
