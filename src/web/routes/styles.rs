//! Dashboard style settings.

use super::{bind, check_csrf};
use crate::{
    router::{HandlerResult, Request, Response, Router},
    web::{App, form::Form, redirect},
};
use std::sync::Arc;

pub(super) fn register(router: &mut Router, app: &Arc<App>) {
    router
        .get("/dashboard/styles", bind(app, edit))
        .post("/dashboard/styles", bind(app, update));
}

fn edit(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    let site = app.load(req)?;
    let csrf = app.sessions.set_csrf(req, res);

    let form = Form::new(&csrf)
        .text("Favicon URL", "favicon", &site.favicon)
        .textarea("Custom CSS", "styles", &site.styles, 24)
        .checkbox("Append to the default stylesheet instead of replacing it", "stylesappend", site.styles_append)
        .checkbox("StackEdit editor", "stackedit", site.stack_edit)
        .checkbox("Prism syntax highlighting", "prism", site.prism)
        .finish("/dashboard/styles", "Save");

    app.render_dashboard(res, "Site styles", form)
}

fn update(app: &App, res: &mut Response, req: &Request) -> HandlerResult {
    check_csrf(app, req)?;
    let form = req.form();

    app.store.update(req.deadline(), |site| {
        site.favicon = form.get("favicon").to_owned();
        site.styles = form.get("styles").to_owned();
        site.styles_append = form.checked("stylesappend");
        site.stack_edit = form.checked("stackedit");
        site.prism = form.checked("prism");
        site.touch();
        Some(())
    })?;

    redirect(res, "/dashboard/styles")
}
