use teloxide::utils::html::escape;

use crate::notify::ClaimNotice;

/// Rejected items joined for humans, "None" when nothing was rejected
pub fn rejected_summary(notice: &ClaimNotice) -> String {
    if notice.rejected.is_empty() {
        "None".to_string()
    } else {
        notice.rejected.join(", ")
    }
}

/// Plain-text email body
pub fn plain_text(notice: &ClaimNotice) -> String {
    format!(
        "Hello! New items were claimed:\n\n{}\n\nAlready taken: {}\n\nVisit the site to see the full list.",
        notice.accepted.join("\n"),
        rejected_summary(notice)
    )
}

/// HTML email body. Item and guest names are user input and get escaped.
pub fn html(notice: &ClaimNotice) -> String {
    let claimed = notice
        .accepted
        .iter()
        .map(|line| escape(line))
        .collect::<Vec<_>>()
        .join("<br>");

    format!(
        "<h2>New gift registry claims</h2>\
         <p><strong>Claimed:</strong></p>\
         <pre style=\"background: #f9f9f9; padding: 10px; border-radius: 5px;\">{}</pre>\
         <p><strong>Already taken:</strong> {}</p>",
        claimed,
        escape(&rejected_summary(notice))
    )
}

/// Telegram message for `ParseMode::Html`
pub fn telegram_html(notice: &ClaimNotice) -> String {
    let claimed = notice
        .accepted
        .iter()
        .map(|line| format!("• {}", escape(line)))
        .collect::<Vec<_>>()
        .join("\n");

    format!(
        "🎁 <b>New registry claims</b>\n\n{}\n\n<i>Already taken:</i> {}",
        claimed,
        escape(&rejected_summary(notice))
    )
}
