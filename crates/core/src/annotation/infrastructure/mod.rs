pub mod rectangle_outliner;
