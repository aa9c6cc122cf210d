mod dashboard;
mod entity_form;
mod entity_list;
mod login;
mod not_found;

pub use dashboard::DashboardView;
pub use entity_form::EntityFormView;
pub use entity_list::{EntityListView, Summary};
pub use login::LoginView;
pub use not_found::NotFoundView;

use crate::app::Context;
use crate::model::{Employee, Project, Testimonial};
use crate::routes::{Collection, Route};
use crate::ui::view::View;

/// Login screen that continues to `redirect` after signing in.
///
/// Only the startup screen takes a password from the environment; one shown
/// after a sign-out or expiry always waits for the user.
pub fn login(ctx: &Context, redirect: Option<Route>) -> Box<dyn View> {
  Box::new(LoginView::new(ctx.clone(), redirect, None))
}

/// The view a route renders
pub fn for_route(route: Route, ctx: &Context) -> Box<dyn View> {
  match route {
    Route::Login => login(ctx, None),
    Route::Dashboard => Box::new(DashboardView::new(ctx.clone())),
    Route::List(c) => list(c, ctx),
    Route::Add(c) => form(c, None, ctx),
    Route::Edit(c, id) => form(c, Some(id), ctx),
    Route::NotFound(path) => Box::new(NotFoundView::new(path)),
  }
}

fn list(collection: Collection, ctx: &Context) -> Box<dyn View> {
  match collection {
    Collection::Employees => Box::new(EntityListView::<Employee>::new(ctx.clone())),
    Collection::Projects => Box::new(EntityListView::<Project>::new(ctx.clone())),
    Collection::Testimonials => Box::new(EntityListView::<Testimonial>::new(ctx.clone())),
  }
}

fn form(collection: Collection, id: Option<String>, ctx: &Context) -> Box<dyn View> {
  let ctx = ctx.clone();
  match collection {
    Collection::Employees => Box::new(EntityFormView::<Employee>::new(ctx, id)),
    Collection::Projects => Box::new(EntityFormView::<Project>::new(ctx, id)),
    Collection::Testimonials => Box::new(EntityFormView::<Testimonial>::new(ctx, id)),
  }
}
