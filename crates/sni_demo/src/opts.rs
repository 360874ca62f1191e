use clap::Parser;

/// Struct that gets generated from `RawOpt`.
#[derive(Debug, PartialEq)]
pub struct Opt {
    pub log_debug: bool,
    pub id: String,
    pub title: Option<String>,
    pub icon: String,
    pub address: Option<String>,
    pub needs_attention: bool,
}

#[derive(Parser, Debug, PartialEq)]
#[command(version, about)]
struct RawOpt {
    /// Write out debug logs.
    #[arg(long = "debug")]
    log_debug: bool,

    /// Id of the item, should stay the same across runs
    #[arg(long, default_value = "sni-demo")]
    id: String,

    /// Title shown by the tray, defaults to the id
    #[arg(long)]
    title: Option<String>,

    /// Freedesktop icon name to start with
    #[arg(long, default_value = "face-smile")]
    icon: String,

    /// Address of the bus to publish on, instead of the session bus
    #[arg(long)]
    address: Option<String>,

    /// Start out asking for attention, until the item gets clicked
    #[arg(long)]
    needs_attention: bool,
}

impl Opt {
    pub fn from_env() -> Self {
        let RawOpt { log_debug, id, title, icon, address, needs_attention } = RawOpt::parse();
        Opt { log_debug, id, title, icon, address, needs_attention }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let opt = RawOpt::try_parse_from(["sni_demo"]).unwrap();
        assert_eq!(opt.id, "sni-demo");
        assert_eq!(opt.icon, "face-smile");
        assert!(opt.title.is_none());
        assert!(!opt.log_debug);
    }

    #[test]
    fn test_flags() {
        let opt = RawOpt::try_parse_from(["sni_demo", "--debug", "--id", "mail", "--title", "Mail", "--needs-attention"]).unwrap();
        assert!(opt.log_debug);
        assert_eq!(opt.id, "mail");
        assert_eq!(opt.title.as_deref(), Some("Mail"));
        assert!(opt.needs_attention);
    }
}
