use anyhow::{Context, Result};
use chrono::Local;
use image::codecs::jpeg::JpegEncoder;
use image::{DynamicImage, RgbaImage};
use log::{error, info, warn};
use rusqlite::Connection;
use std::io::Write;
use std::sync::Arc;
use teloxide::prelude::*;
use teloxide::types::InputFile;
use tokio::sync::Mutex;

use crate::db;
use crate::fonts::FontResolver;
use crate::parser::{parse_receipt_message, ParseError};
use crate::renderer::render;
use crate::templates::TemplateStore;

/// JPEG quality for the outgoing receipt photo.
const JPEG_QUALITY: u8 = 95;

/// Services constructed once at startup and shared by every handler.
///
/// Replaces the module-level singletons of earlier iterations: handlers
/// receive an explicit context instead of touching globals.
pub struct AppContext {
    pub templates: TemplateStore,
    pub fonts: FontResolver,
    pub conn: Arc<Mutex<Connection>>,
    pub admin_chat_id: Option<i64>,
}

impl AppContext {
    pub fn is_admin(&self, chat_id: ChatId) -> bool {
        self.admin_chat_id == Some(chat_id.0)
    }
}

const WELCOME_MESSAGE: &str = "🤖 **BOT DE COMPROBANTES**\n\n\
    Envíame los datos en este formato:\n\
    `Nombre | Monto | Número`\n\n\
    📝 **Ejemplo:**\n\
    `Dora Valencia | 100.00 | 3122122032`\n\n\
    Para comprobante con llave agrega el prefijo LLAVEB:\n\
    `LLAVEB Nombre | Monto | Número | Llave`\n\n\
    ¡Y recibirás tu comprobante actualizado!";

pub async fn message_handler(bot: Bot, msg: Message, ctx: Arc<AppContext>) -> Result<()> {
    let Some(text) = msg.text() else {
        bot.send_message(
            msg.chat.id,
            "❌ Solo puedo procesar mensajes de texto con los datos del comprobante",
        )
        .await?;
        return Ok(());
    };

    info!("Received message from {}: {}", msg.chat.id, text);

    // Registration happens on every contact, independent of rendering.
    if let Some(user) = msg.from.as_ref() {
        let conn = ctx.conn.lock().await;
        db::upsert_user(
            &conn,
            user.id.0 as i64,
            user.username.as_deref(),
            &user.first_name,
        )?;
    }

    if text == "/start" {
        bot.send_message(msg.chat.id, WELCOME_MESSAGE).await?;
        return Ok(());
    }

    if text.starts_with('/') {
        return handle_command(&bot, &msg, &ctx, text).await;
    }

    handle_receipt_request(&bot, &msg, &ctx, text).await
}

/// Admin surface: list, block and unblock users. Gated on the configured
/// admin chat.
async fn handle_command(bot: &Bot, msg: &Message, ctx: &AppContext, text: &str) -> Result<()> {
    let mut parts = text.split_whitespace();
    let command = parts.next().unwrap_or_default();

    if !ctx.is_admin(msg.chat.id) {
        warn!("Ignoring command {} from non-admin chat {}", command, msg.chat.id);
        bot.send_message(msg.chat.id, "❌ Comando no disponible").await?;
        return Ok(());
    }

    match command {
        "/usuarios" => {
            let conn = ctx.conn.lock().await;
            let users = db::list_users(&conn)?;
            if users.is_empty() {
                bot.send_message(msg.chat.id, "No hay usuarios registrados").await?;
                return Ok(());
            }
            let mut lines = vec![format!("👥 {} usuarios registrados:", users.len())];
            for user in users {
                let flag = if user.blocked { "⛔" } else { "✅" };
                let username = user.username.as_deref().unwrap_or("-");
                lines.push(format!(
                    "{} {} (@{}) id:{} comprobantes:{}",
                    flag, user.first_name, username, user.telegram_id, user.receipt_count
                ));
            }
            bot.send_message(msg.chat.id, lines.join("\n")).await?;
        }
        "/bloquear" | "/desbloquear" => {
            let blocked = command == "/bloquear";
            let Some(target) = parts.next().and_then(|s| s.parse::<i64>().ok()) else {
                bot.send_message(msg.chat.id, format!("Uso: {command} <telegram_id>"))
                    .await?;
                return Ok(());
            };
            let updated = {
                let conn = ctx.conn.lock().await;
                let updated = db::set_blocked(&conn, target, blocked)?;
                if updated {
                    let action = if blocked { "blocked" } else { "unblocked" };
                    db::log_action(&conn, target, action, None)?;
                }
                updated
            };
            let reply = if updated {
                if blocked {
                    format!("⛔ Usuario {target} bloqueado")
                } else {
                    format!("✅ Usuario {target} desbloqueado")
                }
            } else {
                format!("❌ No existe el usuario {target}")
            };
            bot.send_message(msg.chat.id, reply).await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "❌ Comando desconocido").await?;
        }
    }
    Ok(())
}

async fn handle_receipt_request(
    bot: &Bot,
    msg: &Message,
    ctx: &AppContext,
    text: &str,
) -> Result<()> {
    let telegram_id = msg.from.as_ref().map(|user| user.id.0 as i64);

    if let Some(id) = telegram_id {
        let conn = ctx.conn.lock().await;
        if db::is_blocked(&conn, id)? {
            info!("Refusing blocked user {id}");
            bot.send_message(msg.chat.id, "⛔ No tienes acceso a este bot")
                .await?;
            return Ok(());
        }
    }

    let request = match parse_receipt_message(text) {
        Ok(request) => request,
        Err(e) => {
            info!("Rejected message from {}: {e}", msg.chat.id);
            return reply_parse_error(bot, msg.chat.id, &e).await;
        }
    };

    let img = match render(&request, &ctx.templates, &ctx.fonts, Local::now()) {
        Ok(img) => img,
        Err(e) => {
            error!("Render failed for {}: {e}", msg.chat.id);
            bot.send_message(msg.chat.id, format!("❌ Error procesando tu solicitud: {e}"))
                .await?;
            return Ok(());
        }
    };

    let caption = format!("✅ Comprobante generado para {}", request.recipient_name);
    send_receipt_photo(bot, msg.chat.id, img, &caption).await?;
    info!("Receipt sent to {}", msg.chat.id);

    if let Some(id) = telegram_id {
        let conn = ctx.conn.lock().await;
        db::record_receipt(&conn, id)?;
        db::log_action(&conn, id, "receipt", Some(request.variant.label()))?;
    }

    Ok(())
}

async fn reply_parse_error(bot: &Bot, chat_id: ChatId, e: &ParseError) -> Result<()> {
    bot.send_message(chat_id, e.user_message()).await?;
    Ok(())
}

/// Encode the raster as JPEG into a per-request temp file and send it as a
/// photo. The temp file is released on every exit path when the guard
/// drops.
async fn send_receipt_photo(
    bot: &Bot,
    chat_id: ChatId,
    img: RgbaImage,
    caption: &str,
) -> Result<()> {
    let mut temp_file = tempfile::Builder::new()
        .prefix("comprobante_")
        .suffix(".jpg")
        .tempfile()
        .context("Failed to create temp file for receipt")?;

    let jpeg = encode_jpeg(img)?;
    temp_file
        .as_file_mut()
        .write_all(&jpeg)
        .context("Failed to write receipt temp file")?;

    bot.send_photo(chat_id, InputFile::file(temp_file.path().to_path_buf()))
        .caption(caption.to_string())
        .await?;

    Ok(())
}

/// JPEG has no alpha channel, so the raster is flattened first.
fn encode_jpeg(img: RgbaImage) -> Result<Vec<u8>> {
    let rgb = DynamicImage::ImageRgba8(img).to_rgb8();
    let mut buf = Vec::new();
    let mut encoder = JpegEncoder::new_with_quality(&mut buf, JPEG_QUALITY);
    encoder
        .encode_image(&rgb)
        .context("Failed to encode receipt as JPEG")?;
    Ok(buf)
}
