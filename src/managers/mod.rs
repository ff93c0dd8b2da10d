// splitscroll state managers
// Managers hold host-reported state: the windows and tabs the relay routes between.

pub mod tab_registry;
