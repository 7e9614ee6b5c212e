//! Reading & writing the configuration file. The format is just a JSON object with the fields of
//! `Config`.

use std::path::Path;

pub mod config;

pub use config::Config;

fn write_config(mut w: impl std::io::Write, config: &Config) -> std::io::Result<()> {
    let mut buf = Vec::<u8>::new();
    facet_json::to_writer(config, &mut buf)
        .map_err(|err| std::io::Error::other(format!("{:?}", err)))?;
    w.write_all(&buf)
}

fn read_config(mut r: impl std::io::Read) -> std::io::Result<Config> {
    let mut buf = Vec::<u8>::new();
    r.read_to_end(&mut buf)?;
    facet_json::from_slice(&buf).map_err(|err| std::io::Error::other(format!("{}", err)))
}

impl Config {
    fn read(path: &Path) -> std::io::Result<Self> {
        let file = std::fs::File::open(path)?;
        read_config(file)
    }

    pub fn read_or_default(path: &Path) -> Self {
        Self::read(path).unwrap_or_else(|e| {
            log::error!("Error loading config from {}: {e}", path.display());
            log::error!("Falling back to default config...");
            Self::default()
        })
    }

    pub fn write(&self, w: impl std::io::Write) -> std::io::Result<()> {
        write_config(w, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_a_complete_file() {
        let json = br#"{
            "target_particle_count": 1000,
            "workgroup_size": 64,
            "background_color": [0.1, 0.2, 0.3],
            "show_overlay": false
        }"#;
        let config = read_config(&json[..]).unwrap();
        assert_eq!(
            config,
            Config {
                target_particle_count: 1000,
                workgroup_size: 64,
                background_color: [0.1, 0.2, 0.3],
                show_overlay: false,
            }
        );
        assert_eq!(config.particle_layout().unwrap().count(), 1024);
    }

    #[test]
    fn written_config_reads_back() {
        let config = Config {
            target_particle_count: 12_345,
            workgroup_size: 128,
            background_color: [0.0, 0.5, 1.0],
            show_overlay: true,
        };
        let mut buf = Vec::new();
        config.write(&mut buf).unwrap();
        assert_eq!(read_config(buf.as_slice()).unwrap(), config);
    }

    #[test]
    fn rejects_garbage() {
        assert!(read_config(&b"not json"[..]).is_err());
    }

    #[test]
    fn missing_file_falls_back_to_default() {
        let config = Config::read_or_default(Path::new("/nonexistent/particles.json"));
        assert_eq!(config, Config::default());
    }

    #[test]
    fn default_is_the_five_million_scenario() {
        let layout = Config::default().particle_layout().unwrap();
        assert_eq!(layout.count(), 5_000_192);
        assert_eq!(layout.dispatch_width(), 19_532);
    }

    #[test]
    fn clear_color_is_opaque() {
        let config = Config {
            background_color: [0.25, 0.5, 0.75],
            ..Config::default()
        };
        assert_eq!(
            config.clear_color(),
            wgpu::Color {
                r: 0.25,
                g: 0.5,
                b: 0.75,
                a: 1.0
            }
        );
    }
}
