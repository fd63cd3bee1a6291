//! Guile Scheme output for Guix.
//!
//! Every function here is pure: descriptors in, text out.

use crate::driver::GenerationReport;
use c2g_core::{LicenseExpr, PackageDescriptor, PackageRef};

/// Module imports needed by the generated definitions.
pub fn render_preamble() -> String {
    [
        "(use-modules (guix build-system cargo))",
        "(use-modules (guix licenses))",
        "(use-modules (guix packages))",
        "(use-modules (guix download))",
        "(use-modules ((guix import utils)",
        "             #:select (beautify-description spdx-string->license)))",
    ]
    .join("\n")
        + "\n"
}

/// The trailing reference that makes the file evaluate to the root package.
pub fn render_root(root: &PackageRef) -> String {
    format!("{}\n", root.guix_variable())
}

/// One `define-public` form.
pub fn render_package(d: &PackageDescriptor) -> String {
    let pkg = &d.package;
    let mut out = String::new();

    out.push_str(&format!("(define-public {}\n", pkg.guix_variable()));
    out.push_str("  (package\n");
    out.push_str(&format!("    (name {})\n", quote(&format!("rust-{}", pkg.name))));
    out.push_str(&format!("    (version {})\n", quote(&pkg.version)));
    out.push_str("    (source\n");
    out.push_str("      (origin\n");
    out.push_str("        (method url-fetch)\n");
    out.push_str(&format!("        (uri (crate-uri {} version))\n", quote(&pkg.name)));
    out.push_str("        (file-name\n");
    out.push_str("          (string-append name \"-\" version \".tar.gz\"))\n");
    out.push_str("        (sha256\n");
    out.push_str("          (base32\n");
    out.push_str(&format!("            {}))))\n", quote(&d.digest)));
    out.push_str("    (build-system cargo-build-system)\n");

    if d.has_dependencies() {
        let mut sections = Vec::new();
        if !d.normal_deps.is_empty() {
            sections.push(input_section("#:cargo-inputs", &d.normal_deps));
        }
        if !d.dev_deps.is_empty() {
            sections.push(input_section("#:cargo-development-inputs", &d.dev_deps));
        }
        out.push_str("    (arguments\n");
        out.push_str("      `(");
        out.push_str(&sections.join("\n        "));
        out.push_str("))\n");
    }

    out.push_str(&format!("    (home-page {})\n", quote(&d.homepage)));
    out.push_str(&format!("    (synopsis {})\n", quote(&d.description)));
    out.push_str("    (description\n");
    out.push_str(&format!(
        "      (beautify-description {}))\n",
        quote(&d.description)
    ));
    out.push_str(&format!("    (license {})))\n", license(&d.license)));

    out
}

/// Preamble, every descriptor in order, then the root reference.
pub fn render_document(report: &GenerationReport) -> String {
    let mut out = render_preamble();
    out.push('\n');
    for descriptor in &report.descriptors {
        out.push_str(&render_package(descriptor));
        out.push('\n');
    }
    out.push_str(&render_root(&report.root));
    out
}

/// `#:keyword` followed by an association list of inputs.
fn input_section(keyword: &str, deps: &[PackageRef]) -> String {
    let entries: Vec<String> = deps
        .iter()
        .map(|dep| {
            format!(
                "({} ,{})",
                quote(&format!("rust-{}", dep.name)),
                dep.guix_variable()
            )
        })
        .collect();
    format!("{}\n        ({})", keyword, entries.join("\n         "))
}

fn license(expr: &LicenseExpr) -> String {
    match expr {
        LicenseExpr::Absent => "#f".to_string(),
        LicenseExpr::Single(id) => spdx(id),
        LicenseExpr::Any(ids) => {
            let calls: Vec<String> = ids.iter().map(|id| spdx(id)).collect();
            format!("(list {})", calls.join("\n                   "))
        }
    }
}

fn spdx(id: &str) -> String {
    format!("(spdx-string->license {})", quote(id))
}

/// A Scheme string literal.
fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            c if c.is_control() => out.push_str(&format!("\\x{:x};", u32::from(c))),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}
