mod driver;
mod lifecycle;
