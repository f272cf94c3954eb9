//! Thin shim over the platform notification service.

pub const REMINDER_TITLE: &str = "Time to Hydrate!";
pub const REMINDER_BODY: &str = "Don't forget to track your water intake";

/// Whether the platform lets us post notifications. The desktop notifiers
/// used here post without a runtime permission prompt; platforms that gate
/// notifications report the denial through this call.
pub fn request_authorization() -> bool {
    true
}

/// Posts the recurring hydration reminder.
pub fn show_reminder() {
    #[cfg(target_os = "macos")]
    {
        if let Err(err) = mac_notification_sys::Notification::new()
            .title(REMINDER_TITLE)
            .message(REMINDER_BODY)
            .send()
        {
            tracing::warn!("unable to post the reminder notification: {err}");
        }
    }

    #[cfg(target_os = "windows")]
    {
        if let Err(err) = winrt_notification::Toast::new(winrt_notification::Toast::POWERSHELL_APP_ID)
            .title(REMINDER_TITLE)
            .text1(REMINDER_BODY)
            .duration(winrt_notification::Duration::Short)
            .sound(None)
            .show()
        {
            tracing::warn!("unable to post the reminder notification: {err}");
        }
    }

    // TODO: Add Linux support
    #[cfg(not(any(target_os = "macos", target_os = "windows")))]
    tracing::info!("{REMINDER_TITLE} {REMINDER_BODY}");
}
