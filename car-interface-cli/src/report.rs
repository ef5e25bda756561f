//! Fingerprint report output (text or JSON)

use anyhow::Result;
use car_interface::{CarParams, Fingerprint};
use serde::Serialize;
use std::io::Write;
use std::path::PathBuf;

/// Everything learned from one replayed log
#[derive(Debug, Serialize)]
pub struct FingerprintReport {
    pub log: PathBuf,
    pub frames: usize,
    pub elapsed_ms: u128,
    pub fingerprint: Fingerprint,
    /// Family name, when the identified model has an interface
    pub interface: Option<String>,
    pub params: Option<CarParams>,
}

impl FingerprintReport {
    pub fn write_json<W: Write>(&self, out: &mut W) -> Result<()> {
        serde_json::to_writer_pretty(&mut *out, self)?;
        writeln!(out)?;
        Ok(())
    }

    pub fn write_text<W: Write>(&self, out: &mut W) -> Result<()> {
        writeln!(out, "═══════════════════════════════════════════════")?;
        writeln!(out, "  Fingerprint: {:?}", self.log)?;
        writeln!(out, "═══════════════════════════════════════════════\n")?;
        writeln!(out, "  Frames replayed: {}", self.frames)?;
        writeln!(out, "  Session time:    {} ms", self.elapsed_ms)?;

        match &self.fingerprint.candidate {
            Some(model) => writeln!(out, "  Model:           {}", model)?,
            None => writeln!(out, "  Model:           (unrecognized)")?,
        }
        match &self.interface {
            Some(name) => writeln!(out, "  Interface:       {}", name)?,
            None => writeln!(out, "  Interface:       none")?,
        }

        if let Some(params) = &self.params {
            writeln!(out, "\n  Parameters:")?;
            writeln!(out, "    mass            {:.1} kg", params.mass)?;
            writeln!(out, "    wheelbase       {:.3} m", params.wheelbase)?;
            writeln!(out, "    steer ratio     {:.1}", params.steer_ratio)?;
            writeln!(out, "    steer max       {}", params.steer_max)?;
            writeln!(out, "    min steer speed {:.1} m/s", params.min_steer_speed)?;
            writeln!(out, "    enable camera   {}", params.enable_camera)?;
        }

        if let Some(signature) = &self.fingerprint.signature {
            writeln!(out, "\n  Signature ({} addresses):", signature.len())?;
            for (address, len) in signature {
                writeln!(out, "    0x{:03X} ({:4}): {}", address, address, len)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use car_interface::Signature;

    fn report() -> FingerprintReport {
        FingerprintReport {
            log: PathBuf::from("drive.log"),
            frames: 3,
            elapsed_ms: 110,
            fingerprint: Fingerprint {
                candidate: Some("CAR A".to_string()),
                signature: Some(Signature::from([(0x100, 8), (0x200, 4)])),
            },
            interface: None,
            params: None,
        }
    }

    #[test]
    fn test_text_report() {
        let mut out = Vec::new();
        report().write_text(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Model:           CAR A"));
        assert!(text.contains("Signature (2 addresses)"));
        assert!(text.contains("0x100 ( 256): 8"));
    }

    #[test]
    fn test_json_report() {
        let mut out = Vec::new();
        report().write_json(&mut out).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&out).unwrap();
        assert_eq!(json["fingerprint"]["candidate"], "CAR A");
        assert_eq!(json["fingerprint"]["signature"]["512"], 4);
        assert_eq!(json["frames"], 3);
    }
}
