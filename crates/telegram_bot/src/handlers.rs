use teloxide::{net::Download, prelude::*, types::User};

use crate::{
    ConfigParameters,
    router::InboundEvent,
    transport::TelegramOutbox,
};

/// Turns a Telegram message into an [`InboundEvent`] and hands it to the
/// router. The cooldown is checked before any photo is downloaded. Always
/// returns `Ok(())`: per-event failures are the router's to report.
pub(crate) async fn handle_message(
    bot: Bot,
    msg: Message,
    cfg: ConfigParameters,
) -> ResponseResult<()> {
    if !is_allowed(&cfg, msg.from.as_ref()) {
        tracing::debug!(chat_id = %msg.chat.id, "message from a user not allowed");
        return Ok(());
    }

    let sender_id = msg.chat.id.0.to_string();
    if !cfg.router.admit(&sender_id).await {
        return Ok(());
    }

    let outbox = TelegramOutbox::new(bot.clone());
    let image = match image_file_id(&msg) {
        Some(file_id) => match download(&bot, file_id).await {
            Ok(bytes) => Some(bytes),
            Err(err) => {
                tracing::error!(%err, %sender_id, "failed to download image");
                cfg.router.image_unavailable(&outbox, &sender_id).await;
                return Ok(());
            }
        },
        None => None,
    };

    let event = InboundEvent {
        sender_id,
        text: msg.text().or(msg.caption()).map(str::to_string),
        image,
    };

    cfg.router.handle_admitted(event, &outbox).await;
    Ok(())
}

/// Largest photo size, or a document sent uncompressed as an image.
fn image_file_id(msg: &Message) -> Option<teloxide::types::FileId> {
    if let Some(sizes) = msg.photo() {
        return sizes.last().map(|photo| photo.file.id.clone());
    }
    msg.document()
        .filter(|doc| {
            doc.mime_type
                .as_ref()
                .is_some_and(|mime| mime.essence_str().starts_with("image/"))
        })
        .map(|doc| doc.file.id.clone())
}

async fn download(
    bot: &Bot,
    file_id: teloxide::types::FileId,
) -> Result<Vec<u8>, Box<dyn std::error::Error + Send + Sync>> {
    let file = bot.get_file(file_id).await?;
    let mut buf = Vec::with_capacity(file.meta.size as usize);
    bot.download_file(&file.path, &mut buf).await?;
    Ok(buf)
}

fn is_allowed(cfg: &ConfigParameters, from: Option<&User>) -> bool {
    let Some(from) = from else {
        return false;
    };
    match cfg.allowed_users.as_deref() {
        None => true,
        Some(ids) => ids.contains(&from.id),
    }
}
