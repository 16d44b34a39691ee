pub mod extrude;
pub mod hologram;
pub mod provinces;
pub mod shapes;
pub mod symbology;
