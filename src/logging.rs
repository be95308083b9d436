// Crossfill – A crossword autofill engine
// Copyright (C) 2024  Neil Roberts
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License
// along with this program.  If not, see <http://www.gnu.org/licenses/>.

/// Sets up the `log` backend. Natively this is `env_logger` writing to
/// stderr, where `RUST_LOG` takes precedence over `verbose`. In the
/// browser messages go to the console.
pub fn init_logger(verbose: bool) {
    #[cfg(target_arch = "wasm32")]
    {
        console_error_panic_hook::set_once();

        let level = if verbose {
            log::Level::Debug
        } else {
            log::Level::Info
        };

        if let Err(e) = console_log::init_with_level(level) {
            web_sys::console::error_1(
                &format!("failed to set up logging: {}", e).into()
            );
        }
    }

    #[cfg(not(target_arch = "wasm32"))]
    {
        let level = if verbose {
            log::LevelFilter::Debug
        } else {
            log::LevelFilter::Info
        };

        let mut builder = env_logger::Builder::new();
        builder
            .filter(None, level)
            .format_timestamp(None)
            .format_module_path(false)
            .format_target(false);

        if let Ok(spec) = std::env::var("RUST_LOG") {
            builder.parse_filters(&spec);
        }

        // Already initialised if called twice
        let _ = builder.try_init();
    }
}
