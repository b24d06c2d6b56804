//! The template set is compiled into the binary so the server has no
//! runtime dependency on a working directory layout.

use tera::Tera;

pub fn build() -> Result<Tera, tera::Error> {
    let mut tera = Tera::default();
    tera.add_raw_templates(vec![
        ("base.html", include_str!("../templates/base.html")),
        ("login.html", include_str!("../templates/login.html")),
        ("index.html", include_str!("../templates/index.html")),
        ("my_account.html", include_str!("../templates/my_account.html")),
        ("list_tags.html", include_str!("../templates/list_tags.html")),
        ("tag_form.html", include_str!("../templates/tag_form.html")),
        ("event_form.html", include_str!("../templates/event_form.html")),
        ("list.html", include_str!("../templates/list.html")),
        ("detail.html", include_str!("../templates/detail.html")),
    ])?;
    Ok(tera)
}
