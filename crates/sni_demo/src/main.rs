use anyhow::{Context, Result};
use notifier_item::{Icon, ItemBuilder, Orientation, Position, RasterImage, Status, StatusNotifierItem};
use std::time::Duration;
use tokio::sync::mpsc;

mod opts;

/// What the tray asked the item to do.
#[derive(Debug)]
enum TrayEvent {
    Activate(Position),
    SecondaryActivate(Position),
    Scroll(i32, Orientation),
    RevertIcon,
}

fn main() {
    let opts = opts::Opt::from_env();

    let log_level_filter = if opts.log_debug { log::LevelFilter::Debug } else { log::LevelFilter::Info };
    if std::env::var("RUST_LOG").is_ok() {
        pretty_env_logger::init_timed();
    } else {
        pretty_env_logger::formatted_timed_builder()
            .filter(Some("sni_demo"), log_level_filter)
            .filter(Some("notifier_item"), log_level_filter)
            .init();
    }

    let result = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to initialize tokio runtime")
        .and_then(|rt| rt.block_on(run(opts)));

    if let Err(err) = result {
        log::error!("{:?}", err);
        std::process::exit(1);
    }
}

/// A small red dot, published as the attention icon.
fn attention_dot() -> Result<Icon> {
    let size = 16u32;
    let center = size as i32 / 2;
    let pixels: Vec<u32> = (0..size * size)
        .map(|i| {
            let (x, y) = ((i % size) as i32 - center, (i / size) as i32 - center);
            if x * x + y * y <= center * center {
                0xffe0_1b24
            } else {
                0
            }
        })
        .collect();
    Ok(Icon::new(vec![RasterImage::from_argb32(size, size, &pixels)?]))
}

async fn run(opts: opts::Opt) -> Result<()> {
    let mut builder = ItemBuilder::new(&opts.id).icon_name(&opts.icon);
    if let Some(title) = &opts.title {
        builder = builder.title(title);
    }
    if let Some(address) = &opts.address {
        builder = builder.address(address);
    }
    let item = builder.build().await.context("Failed to publish the item")?;
    log::info!("published {} as {}", opts.id, item.service_name());

    item.set_attention_icon_by_pixmap(&attention_dot()?).await?;
    item.set_tool_tip_by_name(&opts.icon, "Scroll me", "Click to clear attention, middle click to surprise").await?;
    if opts.needs_attention {
        item.set_status(Status::NeedsAttention).await?;
    }

    let (evt_send, mut evt_recv) = mpsc::unbounded_channel();
    {
        let evt_send = evt_send.clone();
        item.on_activate_requested(move |pos| {
            let _ = evt_send.send(TrayEvent::Activate(pos));
        });
    }
    {
        let evt_send = evt_send.clone();
        item.on_secondary_activate_requested(move |pos| {
            let _ = evt_send.send(TrayEvent::SecondaryActivate(pos));
        });
    }
    {
        let evt_send = evt_send.clone();
        item.on_scroll_requested(move |delta, orientation| {
            let _ = evt_send.send(TrayEvent::Scroll(delta, orientation));
        });
    }

    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            Some(evt) = evt_recv.recv() => handle_event(&item, &opts, evt, &evt_send).await?,
        }
    }

    log::info!("shutting down");
    item.shutdown().await.context("Failed to remove the item from the bus")?;
    Ok(())
}

async fn handle_event(
    item: &StatusNotifierItem,
    opts: &opts::Opt,
    evt: TrayEvent,
    evt_send: &mpsc::UnboundedSender<TrayEvent>,
) -> Result<()> {
    log::debug!("{:?}", evt);
    match evt {
        TrayEvent::Activate(pos) => {
            log::info!("activated at {},{}, status is {}", pos.x, pos.y, item.status());
        }
        TrayEvent::SecondaryActivate(_) => {
            item.set_icon_by_name("face-surprise").await?;
            let evt_send = evt_send.clone();
            tokio::spawn(async move {
                tokio::time::sleep(Duration::from_secs(1)).await;
                let _ = evt_send.send(TrayEvent::RevertIcon);
            });
        }
        TrayEvent::Scroll(delta, orientation) => {
            let icon = if delta < 0 { "face-sad" } else { "face-smile" };
            item.set_icon_by_name(icon).await?;
            item.set_tool_tip_title(&format!("Uhm... last delta was {} ({:?})", delta, orientation)).await?;
        }
        TrayEvent::RevertIcon => {
            item.set_icon_by_name(&opts.icon).await?;
        }
    }
    Ok(())
}
